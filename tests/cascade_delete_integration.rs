/// Cascading deletes against a file-backed database, reopened between steps
/// to make sure nothing is left behind on disk.
use anyhow::Result;
use cognicanvas::editor::Selection;
use cognicanvas::highlight;
use cognicanvas::{
    CanvasService, Database, NewNote, NewNotebook, NewSubject, ServiceError, UserId,
};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Result<CanvasService> {
    let db = Database::open(dir.path().join("canvas.db"))?;
    Ok(CanvasService::new(db))
}

#[test]
fn delete_notebook_removes_notes_and_snippets_but_keeps_siblings() -> Result<()> {
    let dir = TempDir::new()?;
    let user = UserId::from("default-user");

    let (kept, doomed) = {
        let service = open(&dir)?;
        let subject = service.create_subject(&user, NewSubject::named("Biology"))?;
        let cells = service.create_notebook(&user, subject.id, NewNotebook::titled("Cells"))?;
        let genes = service.create_notebook(&user, subject.id, NewNotebook::titled("Genetics"))?;

        let note = service.create_note(
            &user,
            cells.id,
            NewNote::titled("Mitochondria").content("<p>The powerhouse of the cell</p>"),
        )?;
        highlight::mark_important(&service, &user, note.id, Selection::new(0, 4, 14))?;
        service.create_note(&user, genes.id, NewNote::titled("Alleles"))?;
        (genes, cells)
    };

    let service = open(&dir)?;
    let (deleted, report) = service.delete_notebook(&user, doomed.id)?;
    assert_eq!(deleted.title, "Cells");
    assert_eq!(report.notes_deleted, 1);
    assert_eq!(report.snippets_deleted, 1);
    drop(service);

    let service = open(&dir)?;
    assert!(service.get_notebook(&user, doomed.id)?.is_none());
    assert!(service.list_snippets(&user, None)?.is_empty());
    let remaining = service.list_notes(&user, kept.id)?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title, "Alleles");
    Ok(())
}

#[test]
fn batch_limit_leaves_store_untouched() -> Result<()> {
    let dir = TempDir::new()?;
    let user = UserId::from("default-user");

    let subject = {
        let service = open(&dir)?;
        let subject = service.create_subject(&user, NewSubject::named("History"))?;
        let notebook = service.create_notebook(&user, subject.id, NewNotebook::titled("Rome"))?;
        for title in ["Republic", "Empire", "Fall"] {
            service.create_note(&user, notebook.id, NewNote::titled(title))?;
        }
        subject
    };

    let service = open(&dir)?.with_max_batch_operations(3);
    let err = service.delete_subject(&user, subject.id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::BatchLimitExceeded {
            operations: 5,
            limit: 3
        }
    ));
    drop(service);

    let service = open(&dir)?;
    let notebooks = service.list_notebooks(&user, subject.id)?;
    assert_eq!(notebooks.len(), 1);
    assert_eq!(service.list_notes(&user, notebooks[0].id)?.len(), 3);
    Ok(())
}

#[test]
fn other_users_cannot_delete() -> Result<()> {
    let dir = TempDir::new()?;
    let owner = UserId::from("owner");
    let service = open(&dir)?;
    let subject = service.create_subject(&owner, NewSubject::named("Art"))?;

    let err = service
        .delete_subject(&UserId::from("intruder"), subject.id)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
    assert_eq!(service.list_subjects(&owner)?.len(), 1);
    Ok(())
}
