use std::collections::BTreeMap;

use codevault::db::Database;
use codevault::models::*;
use codevault::VaultError;
use speculate2::speculate;
use uuid::Uuid;

fn template(files: &[(&str, &str)]) -> Template {
    Template {
        id: "test".to_string(),
        name: "Test Template".to_string(),
        framework: Framework::Vanilla,
        entry_file: files.first().map(|(p, _)| p.to_string()).unwrap_or_default(),
        files: files
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect(),
    }
}

fn create_test_project(db: &Database, files: &[(&str, &str)]) -> Project {
    db.create_project(&template(files), Some("Test Project"))
        .expect("Failed to create project")
        .expect("Project limit reached")
}

fn file_map(db: &Database, project_id: Uuid) -> BTreeMap<String, String> {
    db.list_files(project_id)
        .expect("Query failed")
        .into_iter()
        .map(|f| (f.path, f.content))
        .collect()
}

fn content(db: &Database, project_id: Uuid, path: &str) -> Option<String> {
    db.get_file(project_id, path)
        .expect("Query failed")
        .map(|f| f.content)
}

fn index(db: &Database, project_id: Uuid) -> i64 {
    db.get_project(project_id)
        .expect("Query failed")
        .expect("Project not found")
        .snapshot_index
}

fn orders(db: &Database, project_id: Uuid) -> Vec<i64> {
    db.list_snapshots(project_id)
        .expect("Query failed")
        .iter()
        .map(|s| s.order)
        .collect()
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "projects" {
        describe "create_project" {
            it "seeds files and an initial snapshot from the template" {
                let project = create_test_project(&db, &[("index.html", "<h1>"), ("main.js", "1")]);

                assert_eq!(project.name, "Test Project");
                assert_eq!(project.framework, Framework::Vanilla);
                assert_eq!(project.entry_file, "index.html");
                assert_eq!(project.snapshot_index, 0);
                assert_eq!(file_map(&db, project.id).len(), 2);

                let snapshots = db.list_snapshots(project.id).expect("Query failed");
                assert_eq!(snapshots.len(), 1);
                assert_eq!(snapshots[0].order, 0);
                assert_eq!(snapshots[0].label.as_deref(), Some("Initial template"));
                assert_eq!(snapshots[0].files.len(), 2);
            }

            it "falls back to the template name when the name is blank" {
                let project = db.create_project(&template(&[("a.js", "")]), Some("   "))
                    .expect("Failed to create")
                    .expect("Project limit reached");
                assert_eq!(project.name, "Test Template");

                let project = db.create_project(&template(&[("a.js", "")]), None)
                    .expect("Failed to create")
                    .expect("Project limit reached");
                assert_eq!(project.name, "Test Template");
            }

            it "normalizes the template entry file" {
                let mut seed = template(&[("index.html", "<h1>")]);
                seed.entry_file = "./index.html".to_string();

                let project = db.create_project(&seed, None)
                    .expect("Failed to create")
                    .expect("Project limit reached");
                assert_eq!(project.entry_file, "index.html");
            }

            it "fingerprints seeded files" {
                let project = create_test_project(&db, &[("a.js", "let a;")]);
                let file = db.get_file(project.id, "a.js").expect("Query failed").expect("File missing");
                assert_eq!(file.fingerprint, codevault::fingerprint::fingerprint("let a;"));
            }

            it "returns None once the project cap is reached" {
                let db = db.with_max_projects(2);
                create_test_project(&db, &[("a.js", "")]);
                create_test_project(&db, &[("a.js", "")]);

                let third = db.create_project(&template(&[("a.js", "")]), None).expect("Query failed");
                assert!(third.is_none());
                assert_eq!(db.count_projects().expect("Query failed"), 2);
            }
        }

        describe "list_projects" {
            it "returns empty list when no projects exist" {
                assert!(db.list_projects().expect("Query failed").is_empty());
            }

            it "orders projects by most recent update" {
                let first = create_test_project(&db, &[("a.js", "1")]);
                let second = create_test_project(&db, &[("a.js", "1")]);
                std::thread::sleep(std::time::Duration::from_millis(2));
                db.update_file(first.id, "a.js", "2").expect("Failed to update");

                let projects = db.list_projects().expect("Query failed");
                assert_eq!(projects.len(), 2);
                assert_eq!(projects[0].id, first.id);
                assert_eq!(projects[1].id, second.id);
            }
        }

        describe "duplicate_project" {
            it "copies current files into a fresh single-entry history" {
                let source = create_test_project(&db, &[("a.js", "a"), ("b.js", "b"), ("c.js", "c")]);
                db.update_file(source.id, "a.js", "a2").expect("Failed to update");

                let copy = db.duplicate_project(source.id)
                    .expect("Query failed")
                    .expect("Duplicate failed");

                assert_ne!(copy.id, source.id);
                assert_eq!(copy.name, "Test Project (copy)");
                assert_eq!(copy.snapshot_index, 0);
                assert_eq!(file_map(&db, copy.id), file_map(&db, source.id));

                let snapshots = db.list_snapshots(copy.id).expect("Query failed");
                assert_eq!(snapshots.len(), 1);
                assert_eq!(snapshots[0].label.as_deref(), Some("Duplicated project"));
                assert!(!db.undo(copy.id).expect("Undo failed"));
            }

            it "carries the entry file over to the copy" {
                let source = create_test_project(&db, &[("index.html", "<h1>"), ("main.js", "")]);
                db.set_entry_file(source.id, "main.js").expect("Failed to set entry file");

                let copy = db.duplicate_project(source.id).expect("Query failed").expect("Duplicate failed");
                assert_eq!(copy.entry_file, "main.js");
                assert_eq!(db.count_projects().expect("Query failed"), 2);
            }

            it "keeps the copy independent of the source" {
                let source = create_test_project(&db, &[("a.js", "a"), ("b.js", "b"), ("c.js", "c")]);
                let copy = db.duplicate_project(source.id).expect("Query failed").expect("Duplicate failed");
                let before = file_map(&db, source.id);

                db.update_file(copy.id, "a.js", "changed").expect("Failed to update");
                db.delete_file(copy.id, "b.js").expect("Failed to delete");
                db.create_file(copy.id, "d.js", "new").expect("Failed to create");

                assert_eq!(file_map(&db, source.id), before);
                assert_eq!(orders(&db, source.id), vec![0]);
                assert_eq!(index(&db, source.id), 0);
            }

            it "returns None for a missing source" {
                assert!(db.duplicate_project(Uuid::new_v4()).expect("Query failed").is_none());
            }

            it "returns None once the project cap is reached" {
                let db = db.with_max_projects(1);
                let source = create_test_project(&db, &[("a.js", "")]);
                assert!(db.duplicate_project(source.id).expect("Query failed").is_none());
                assert_eq!(db.count_projects().expect("Query failed"), 1);
            }
        }

        describe "rename_project" {
            it "renames the project" {
                let project = create_test_project(&db, &[("a.js", "")]);
                db.rename_project(project.id, "  Renamed ").expect("Rename failed");

                let found = db.get_project(project.id).expect("Query failed").expect("Missing");
                assert_eq!(found.name, "Renamed");
            }

            it "ignores blank names" {
                let project = create_test_project(&db, &[("a.js", "")]);
                db.rename_project(project.id, "   ").expect("Rename failed");

                let found = db.get_project(project.id).expect("Query failed").expect("Missing");
                assert_eq!(found.name, "Test Project");
            }

            it "reports a missing project" {
                let result = db.rename_project(Uuid::new_v4(), "Name");
                assert!(matches!(result, Err(VaultError::NotFound(_))));
            }
        }

        describe "delete_project" {
            it "cascades to files and snapshots" {
                let project = create_test_project(&db, &[("a.js", "1")]);
                db.update_file(project.id, "a.js", "2").expect("Failed to update");

                assert!(db.delete_project(project.id).expect("Delete failed"));

                assert!(db.get_project(project.id).expect("Query failed").is_none());
                assert!(db.list_files(project.id).expect("Query failed").is_empty());
                assert!(db.list_snapshots(project.id).expect("Query failed").is_empty());
            }

            it "returns false for a missing project" {
                assert!(!db.delete_project(Uuid::new_v4()).expect("Delete failed"));
            }

            it "frees a slot under the cap" {
                let db = db.with_max_projects(1);
                let project = create_test_project(&db, &[("a.js", "")]);
                db.delete_project(project.id).expect("Delete failed");

                assert!(db.create_project(&template(&[("a.js", "")]), None).expect("Query failed").is_some());
            }
        }

        describe "set_entry_file" {
            it "points the project at an existing file" {
                let project = create_test_project(&db, &[("index.html", ""), ("main.js", "")]);
                let updated = db.set_entry_file(project.id, "main.js").expect("Failed to set entry");
                assert_eq!(updated.entry_file, "main.js");
            }

            it "rejects a missing file" {
                let project = create_test_project(&db, &[("index.html", "")]);
                let result = db.set_entry_file(project.id, "nope.js");
                assert!(matches!(result, Err(VaultError::NotFound(_))));
            }
        }

        describe "active_project" {
            it "falls back to the most recently updated project" {
                assert!(db.active_project().expect("Query failed").is_none());

                create_test_project(&db, &[("a.js", "")]);
                std::thread::sleep(std::time::Duration::from_millis(2));
                let latest = create_test_project(&db, &[("a.js", "")]);

                let active = db.active_project().expect("Query failed").expect("No project");
                assert_eq!(active.id, latest.id);
            }

            it "returns the remembered project" {
                let remembered = create_test_project(&db, &[("a.js", "")]);
                std::thread::sleep(std::time::Duration::from_millis(2));
                create_test_project(&db, &[("a.js", "")]);

                db.set_active_project(remembered.id).expect("Failed to set");
                let active = db.active_project().expect("Query failed").expect("No project");
                assert_eq!(active.id, remembered.id);
            }

            it "forgets a deleted project" {
                let remembered = create_test_project(&db, &[("a.js", "")]);
                let other = create_test_project(&db, &[("a.js", "")]);
                db.set_active_project(remembered.id).expect("Failed to set");
                db.delete_project(remembered.id).expect("Delete failed");

                let active = db.active_project().expect("Query failed").expect("No project");
                assert_eq!(active.id, other.id);
            }
        }
    }

    describe "files" {
        describe "create_file" {
            it "creates the file and commits a snapshot" {
                let project = create_test_project(&db, &[("a.js", "")]);
                let file = db.create_file(project.id, "/src/b.js", "b").expect("Failed to create");

                assert_eq!(file.path, "src/b.js");
                assert_eq!(file.fingerprint, codevault::fingerprint::fingerprint("b"));
                assert_eq!(index(&db, project.id), 1);

                let snapshot = db.get_snapshot(project.id, 1).expect("Query failed").expect("Missing");
                assert_eq!(snapshot.label.as_deref(), Some("Create src/b.js"));
                assert_eq!(snapshot.files.len(), 2);
            }

            it "rejects an existing path" {
                let project = create_test_project(&db, &[("a.js", "original")]);
                let result = db.create_file(project.id, "a.js", "other");

                assert!(matches!(result, Err(VaultError::Conflict(_))));
                assert_eq!(content(&db, project.id, "a.js").as_deref(), Some("original"));
                assert_eq!(index(&db, project.id), 0);
            }

            it "rejects an empty path" {
                let project = create_test_project(&db, &[("a.js", "")]);
                let result = db.create_file(project.id, "  ", "");
                assert!(matches!(result, Err(VaultError::InvalidInput(_))));
            }

            it "rejects directory-like paths" {
                let project = create_test_project(&db, &[("a.js", "")]);

                let result = db.create_file(project.id, "notes/", "x");
                assert!(matches!(result, Err(VaultError::InvalidInput(_))));
                let result = db.create_file(project.id, "src//b.js", "x");
                assert!(matches!(result, Err(VaultError::InvalidInput(_))));

                assert_eq!(file_map(&db, project.id).len(), 1);
                assert_eq!(index(&db, project.id), 0);
            }

            it "reports a missing project" {
                let result = db.create_file(Uuid::new_v4(), "a.js", "");
                assert!(matches!(result, Err(VaultError::NotFound(_))));
            }
        }

        describe "update_file" {
            it "replaces content and recomputes the fingerprint" {
                let project = create_test_project(&db, &[("a.js", "1")]);
                let file = db.update_file(project.id, "a.js", "2").expect("Failed to update");

                assert_eq!(file.content, "2");
                assert_eq!(file.fingerprint, codevault::fingerprint::fingerprint("2"));
                assert_eq!(index(&db, project.id), 1);
            }

            it "inserts a missing path" {
                let project = create_test_project(&db, &[("a.js", "1")]);
                db.update_file(project.id, "b.js", "new").expect("Failed to update");
                assert_eq!(content(&db, project.id, "b.js").as_deref(), Some("new"));
            }
        }

        describe "save_draft" {
            it "writes content without recording a snapshot" {
                let project = create_test_project(&db, &[("a.js", "1")]);
                db.save_draft(project.id, "a.js", "draft").expect("Failed to save");

                assert_eq!(content(&db, project.id, "a.js").as_deref(), Some("draft"));
                assert_eq!(index(&db, project.id), 0);
                assert_eq!(orders(&db, project.id), vec![0]);
            }

            it "is captured by the next commit" {
                let project = create_test_project(&db, &[("a.js", "1")]);
                db.save_draft(project.id, "a.js", "d1").expect("Failed to save");
                db.save_draft(project.id, "a.js", "d2").expect("Failed to save");
                let snapshot = db.commit_snapshot(project.id, Some("Checkpoint")).expect("Commit failed");

                assert_eq!(snapshot.order, 1);
                assert_eq!(snapshot.files[0].content, "d2");
                assert_eq!(index(&db, project.id), 1);
            }
        }

        describe "delete_file" {
            it "removes the file and commits a snapshot" {
                let project = create_test_project(&db, &[("a.js", "1"), ("b.js", "2")]);
                assert!(db.delete_file(project.id, "b.js").expect("Delete failed"));

                assert!(content(&db, project.id, "b.js").is_none());
                assert_eq!(index(&db, project.id), 1);
            }

            it "is a no-op for a missing file" {
                let project = create_test_project(&db, &[("a.js", "1")]);
                assert!(!db.delete_file(project.id, "nope.js").expect("Delete failed"));
                assert!(!db.delete_file(Uuid::new_v4(), "a.js").expect("Delete failed"));
                assert_eq!(index(&db, project.id), 0);
            }
        }

        describe "rename_file" {
            it "moves content to the new path" {
                let project = create_test_project(&db, &[("a.js", "body"), ("b.js", "")]);
                let file = db.rename_file(project.id, "b.js", "c.js").expect("Rename failed");

                assert_eq!(file.path, "c.js");
                assert!(content(&db, project.id, "b.js").is_none());
                assert_eq!(content(&db, project.id, "c.js").as_deref(), Some(""));
                assert_eq!(index(&db, project.id), 1);
            }

            it "leaves files untouched when the target exists" {
                let project = create_test_project(&db, &[("a.js", "a"), ("b.js", "b")]);
                let before = file_map(&db, project.id);

                let result = db.rename_file(project.id, "a.js", "b.js");

                assert!(matches!(result, Err(VaultError::Conflict(_))));
                assert_eq!(file_map(&db, project.id), before);
                assert_eq!(index(&db, project.id), 0);
            }

            it "reports a missing source" {
                let project = create_test_project(&db, &[("a.js", "a")]);
                let result = db.rename_file(project.id, "nope.js", "b.js");

                assert!(matches!(result, Err(VaultError::NotFound(_))));
                assert_eq!(file_map(&db, project.id).len(), 1);
            }

            it "moves the entry file along with the file" {
                let project = create_test_project(&db, &[("index.html", "<p>")]);
                db.rename_file(project.id, "index.html", "home.html").expect("Rename failed");

                let found = db.get_project(project.id).expect("Query failed").expect("Missing");
                assert_eq!(found.entry_file, "home.html");
            }
        }
    }

    describe "history" {
        it "counts one snapshot per commit" {
            let project = create_test_project(&db, &[("a.js", "0")]);
            for n in 1..=5 {
                db.update_file(project.id, "a.js", &n.to_string()).expect("Failed to update");
            }

            assert_eq!(index(&db, project.id), 5);
            assert_eq!(orders(&db, project.id), vec![0, 1, 2, 3, 4, 5]);
        }

        it "walks back through edits and stops at the start" {
            let project = create_test_project(&db, &[("A", "1")]);
            db.update_file(project.id, "A", "2").expect("Failed to update");
            assert_eq!(index(&db, project.id), 1);
            db.update_file(project.id, "A", "3").expect("Failed to update");
            assert_eq!(index(&db, project.id), 2);

            assert!(db.undo(project.id).expect("Undo failed"));
            assert_eq!(content(&db, project.id, "A").as_deref(), Some("2"));
            assert_eq!(index(&db, project.id), 1);

            assert!(db.undo(project.id).expect("Undo failed"));
            assert_eq!(content(&db, project.id, "A").as_deref(), Some("1"));
            assert_eq!(index(&db, project.id), 0);

            assert!(!db.undo(project.id).expect("Undo failed"));
            assert_eq!(content(&db, project.id, "A").as_deref(), Some("1"));
            assert_eq!(index(&db, project.id), 0);
        }

        it "restores the exact file set" {
            let project = create_test_project(&db, &[("a.js", "a"), ("b.js", "b")]);
            db.create_file(project.id, "c.js", "c").expect("Failed to create");
            db.delete_file(project.id, "a.js").expect("Failed to delete");

            db.undo(project.id).expect("Undo failed");
            db.undo(project.id).expect("Undo failed");

            let expected: BTreeMap<String, String> =
                [("a.js", "a"), ("b.js", "b")].iter().map(|(p, c)| (p.to_string(), c.to_string())).collect();
            assert_eq!(file_map(&db, project.id), expected);
        }

        it "keeps snapshot fingerprints when restoring" {
            let project = create_test_project(&db, &[("a.js", "a")]);
            db.update_file(project.id, "a.js", "b").expect("Failed to update");
            db.undo(project.id).expect("Undo failed");

            let file = db.get_file(project.id, "a.js").expect("Query failed").expect("Missing");
            assert_eq!(file.fingerprint, codevault::fingerprint::fingerprint("a"));
        }

        it "round-trips undo then redo" {
            let project = create_test_project(&db, &[("a.js", "a")]);
            db.update_file(project.id, "a.js", "a2").expect("Failed to update");
            db.create_file(project.id, "b.js", "b").expect("Failed to create");
            let before = file_map(&db, project.id);

            assert!(db.undo(project.id).expect("Undo failed"));
            assert_ne!(file_map(&db, project.id), before);
            assert!(db.redo(project.id).expect("Redo failed"));

            assert_eq!(file_map(&db, project.id), before);
            assert_eq!(index(&db, project.id), 2);
        }

        it "does nothing when redoing at the newest snapshot" {
            let project = create_test_project(&db, &[("a.js", "a")]);
            db.update_file(project.id, "a.js", "b").expect("Failed to update");

            assert!(!db.redo(project.id).expect("Redo failed"));
            assert_eq!(index(&db, project.id), 1);
        }

        it "never creates or removes snapshots on undo and redo" {
            let project = create_test_project(&db, &[("a.js", "a")]);
            db.update_file(project.id, "a.js", "b").expect("Failed to update");
            db.update_file(project.id, "a.js", "c").expect("Failed to update");

            db.undo(project.id).expect("Undo failed");
            db.undo(project.id).expect("Undo failed");
            db.redo(project.id).expect("Redo failed");

            assert_eq!(orders(&db, project.id), vec![0, 1, 2]);
        }

        it "discards the redo branch on a new commit" {
            let project = create_test_project(&db, &[("a.js", "1")]);
            db.update_file(project.id, "a.js", "2").expect("Failed to update");
            db.update_file(project.id, "a.js", "3").expect("Failed to update");

            db.undo(project.id).expect("Undo failed");
            db.undo(project.id).expect("Undo failed");
            db.update_file(project.id, "a.js", "branch").expect("Failed to update");

            assert_eq!(orders(&db, project.id), vec![0, 1]);
            assert_eq!(index(&db, project.id), 1);
            assert!(!db.redo(project.id).expect("Redo failed"));
            assert_eq!(content(&db, project.id, "a.js").as_deref(), Some("branch"));
        }

        it "treats a missing project as a boundary" {
            assert!(!db.undo(Uuid::new_v4()).expect("Undo failed"));
            assert!(!db.redo(Uuid::new_v4()).expect("Redo failed"));
        }

        it "reports history status" {
            let project = create_test_project(&db, &[("a.js", "1")]);
            db.update_file(project.id, "a.js", "2").expect("Failed to update");
            db.undo(project.id).expect("Undo failed");

            let status = db.history_status(project.id).expect("Query failed").expect("Missing");
            assert_eq!(status, HistoryStatus { index: 0, total: 2, can_undo: false, can_redo: true });
            assert!(db.history_status(Uuid::new_v4()).expect("Query failed").is_none());
        }

        it "rejects commits for a missing project" {
            let result = db.commit_snapshot(Uuid::new_v4(), None);
            assert!(matches!(result, Err(VaultError::NotFound(_))));
        }
    }
}

#[test]
fn history_survives_reopening_the_database() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("vault.db");

    let project_id = {
        let db = Database::open(path.clone()).expect("Failed to open");
        db.migrate().expect("Failed to migrate");
        let project = create_test_project(&db, &[("a.js", "1")]);
        db.update_file(project.id, "a.js", "2").expect("Failed to update");
        project.id
    };

    let db = Database::open(path).expect("Failed to reopen");
    db.migrate().expect("Failed to migrate");

    assert_eq!(index(&db, project_id), 1);
    assert!(db.undo(project_id).expect("Undo failed"));
    assert_eq!(content(&db, project_id, "a.js").as_deref(), Some("1"));
}

#[test]
fn failed_commit_rolls_back_the_whole_edit() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("vault.db");

    let db = Database::open(path.clone()).expect("Failed to open");
    db.migrate().expect("Failed to migrate");
    let project = create_test_project(&db, &[("a.js", "0")]);
    db.update_file(project.id, "a.js", "1").expect("Failed to update");
    db.update_file(project.id, "a.js", "2").expect("Failed to update");
    assert!(db.undo(project.id).expect("Undo failed"));

    let other = rusqlite::Connection::open(&path).expect("Failed to open second connection");
    other
        .execute_batch(
            "CREATE TRIGGER reject_snapshots BEFORE INSERT ON snapshots
             BEGIN SELECT RAISE(ABORT, 'snapshots are read-only'); END;",
        )
        .expect("Failed to install trigger");
    drop(other);

    let result = db.update_file(project.id, "a.js", "edited");
    assert!(matches!(result, Err(VaultError::Storage(_))));

    assert_eq!(content(&db, project.id, "a.js").as_deref(), Some("1"));
    assert_eq!(index(&db, project.id), 1);
    assert_eq!(orders(&db, project.id), vec![0, 1, 2]);
}
