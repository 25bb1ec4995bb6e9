//! Integration tests for recursive duplication.

mod helpers;

use std::collections::BTreeMap;

use filevault_core::error::ErrorKind;
use filevault_entity::ItemKind;
use filevault_entity::folder::FolderNode;
use filevault_service::{DuplicatedItem, RequestContext};

use helpers::{LOCK_PASSWORD, TestApp};

/// Shape of a tree as (depth, name, file count) triples, in BFS order.
fn shape(node: &FolderNode) -> Vec<(u32, String, u64)> {
    let mut out = vec![(node.depth, node.name.clone(), node.file_count)];
    let mut level: Vec<&FolderNode> = node.children.iter().collect();
    while !level.is_empty() {
        let mut next = Vec::new();
        for child in level {
            out.push((child.depth, child.name.clone(), child.file_count));
            next.extend(child.children.iter());
        }
        level = next;
    }
    out
}

async fn file_names(app: &TestApp, ctx: &RequestContext, folder_id: i64) -> BTreeMap<String, String> {
    let mut names = BTreeMap::new();
    for file in app.services.files.list_files(ctx, Some(folder_id)).await.unwrap() {
        let data = app.services.files.read_content(ctx, file.id, None).await.unwrap();
        let mut content = Vec::new();
        let mut stream = data.1;
        while let Some(chunk) = futures::StreamExt::next(&mut stream).await {
            content.extend_from_slice(&chunk.unwrap());
        }
        names.insert(file.name, String::from_utf8(content).unwrap());
    }
    names
}

#[tokio::test]
async fn test_duplicate_folder_copies_whole_subtree() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user_with_lock("alice").await;

    let docs = app.folder(&ctx, "Docs", None).await;
    let inner = app.folder(&ctx, "Inner", Some(docs.id)).await;
    let deep = app.folder(&ctx, "Deep", Some(inner.id)).await;
    app.folder(&ctx, "Empty", Some(docs.id)).await;
    app.upload(&ctx, "a.txt", "alpha", Some(docs.id)).await;
    app.upload(&ctx, "b.txt", "beta", Some(inner.id)).await;
    app.upload(&ctx, "c.txt", "gamma", Some(deep.id)).await;
    app.services.folders.lock_folder(&ctx, inner.id).await.unwrap();
    app.services.folders.toggle_important(&ctx, docs.id).await.unwrap();
    app.services.folders.set_folder_color(&ctx, docs.id, "red").await.unwrap();

    let target = app.folder(&ctx, "Target", None).await;
    let before_tree = app.services.folders.get_tree(&ctx, docs.id).await.unwrap();
    let blobs_before = app.store.len();

    let result = app
        .services
        .duplication
        .duplicate(&ctx, docs.id, ItemKind::Folder, Some(target.id), Some(LOCK_PASSWORD), false)
        .await
        .unwrap();
    assert_eq!(result.folders_copied, 4);
    assert_eq!(result.files_copied, 3);
    assert_eq!(app.store.len(), blobs_before + 3);

    let DuplicatedItem::Folder(copy) = result.item else {
        panic!("expected a folder copy");
    };
    assert_eq!(copy.name, "Docs (Copy)");
    assert_eq!(copy.parent_id, Some(target.id));
    assert_eq!(copy.folder_color, "red");
    assert!(!copy.is_important);
    assert!(!copy.is_locked);

    let copied_tree = app.services.folders.get_tree(&ctx, copy.id).await.unwrap();
    let expected: Vec<(u32, String, u64)> = shape(&before_tree)
        .into_iter()
        .map(|(depth, name, files)| (depth, format!("{name} (Copy)"), files))
        .collect();
    assert_eq!(shape(&copied_tree), expected);

    // Copies are unlocked even where the source was locked.
    let copied_inner = &copied_tree.children[0];
    assert_eq!(copied_inner.name, "Inner (Copy)");
    assert!(!copied_inner.is_locked);

    let copied_files = file_names(&app, &ctx, copied_inner.id).await;
    assert_eq!(
        copied_files,
        BTreeMap::from([("b.txt (Copy)".to_string(), "beta".to_string())])
    );

    // The source is untouched.
    let after_tree = app.services.folders.get_tree(&ctx, docs.id).await.unwrap();
    assert_eq!(shape(&after_tree), shape(&before_tree));
    assert_eq!(
        file_names(&app, &ctx, docs.id).await,
        BTreeMap::from([("a.txt".to_string(), "alpha".to_string())])
    );
}

#[tokio::test]
async fn test_duplicate_without_destination_lands_next_to_source() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;

    let parent = app.folder(&ctx, "Parent", None).await;
    let child = app.folder(&ctx, "Child", Some(parent.id)).await;
    let file = app.upload(&ctx, "notes.txt", "n", Some(child.id)).await;

    let result = app
        .services
        .duplication
        .duplicate(&ctx, child.id, ItemKind::Folder, None, None, false)
        .await
        .unwrap();
    let DuplicatedItem::Folder(copy) = result.item else {
        panic!("expected a folder copy");
    };
    assert_eq!(copy.parent_id, Some(parent.id));

    let result = app
        .services
        .duplication
        .duplicate(&ctx, file.id, ItemKind::File, None, None, false)
        .await
        .unwrap();
    assert_eq!(result.folders_copied, 0);
    assert_eq!(result.files_copied, 1);
    let DuplicatedItem::File(copy) = result.item else {
        panic!("expected a file copy");
    };
    assert_eq!(copy.name, "notes.txt (Copy)");
    assert_eq!(copy.folder_id, Some(child.id));
    assert_ne!(copy.location, file.location);
    assert_eq!(copy.size, file.size);
    assert_eq!(copy.mime_type, file.mime_type);
}

#[tokio::test]
async fn test_duplicate_file_into_folder_keeps_category() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user_with_lock("alice").await;

    let category = app.services.categories.create_category(&ctx, "Receipts").await.unwrap();
    let file = app.upload(&ctx, "r.pdf", "%PDF", None).await;
    app.services
        .files
        .assign_category(&ctx, file.id, Some(category.id))
        .await
        .unwrap();
    app.services.files.lock_file(&ctx, file.id).await.unwrap();
    let dest = app.folder(&ctx, "Archive", None).await;

    let result = app
        .services
        .duplication
        .duplicate(&ctx, file.id, ItemKind::File, Some(dest.id), Some(LOCK_PASSWORD), false)
        .await
        .unwrap();
    let DuplicatedItem::File(copy) = result.item else {
        panic!("expected a file copy");
    };
    assert_eq!(copy.folder_id, Some(dest.id));
    assert_eq!(copy.category_id, Some(category.id));
    assert!(!copy.is_locked);
}

#[tokio::test]
async fn test_duplicate_into_own_subtree_is_conflict() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;

    let top = app.folder(&ctx, "top", None).await;
    let sub = app.folder(&ctx, "sub", Some(top.id)).await;
    app.upload(&ctx, "x.txt", "x", Some(sub.id)).await;
    let (folders, files) = (app.folder_count().await, app.file_count().await);

    for dest in [top.id, sub.id] {
        let err = app
            .services
            .duplication
            .duplicate(&ctx, top.id, ItemKind::Folder, Some(dest), None, false)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    assert_eq!(app.folder_count().await, folders);
    assert_eq!(app.file_count().await, files);
}

#[tokio::test]
async fn test_duplicate_checks_source_and_destination_ownership() {
    let app = TestApp::new().await;
    let (_, alice) = app.create_user("alice").await;
    let (_, bob) = app.create_user("bob").await;

    let alices = app.folder(&alice, "alices", None).await;
    let bobs = app.folder(&bob, "bobs", None).await;

    let err = app
        .services
        .duplication
        .duplicate(&bob, alices.id, ItemKind::Folder, None, None, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = app
        .services
        .duplication
        .duplicate(&alice, alices.id, ItemKind::Folder, Some(bobs.id), None, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = app
        .services
        .duplication
        .duplicate(&alice, 31337, ItemKind::File, None, None, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_failed_duplication_leaves_nothing_behind() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;

    let top = app.folder(&ctx, "top", None).await;
    let sub = app.folder(&ctx, "sub", Some(top.id)).await;
    app.upload(&ctx, "first.txt", "1", Some(top.id)).await;
    let broken = app.upload(&ctx, "second.txt", "2", Some(sub.id)).await;
    assert!(app.store.forget(&broken.location));

    let (folders, files, blobs) = (
        app.folder_count().await,
        app.file_count().await,
        app.store.len(),
    );

    let err = app
        .services
        .duplication
        .duplicate(&ctx, top.id, ItemKind::Folder, None, None, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    assert_eq!(app.folder_count().await, folders);
    assert_eq!(app.file_count().await, files);
    assert_eq!(app.store.len(), blobs);

    // The pool is usable again after the rollback.
    app.folder(&ctx, "after", None).await;
}

#[tokio::test]
async fn test_duplicate_locked_source_requires_lock_password() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user_with_lock("alice").await;

    let secret = app.folder(&ctx, "Secret", None).await;
    app.upload(&ctx, "diary.txt", "dear diary", Some(secret.id)).await;
    app.services.folders.lock_folder(&ctx, secret.id).await.unwrap();
    let outer = app.folder(&ctx, "Outer", None).await;
    let hidden = app.upload(&ctx, "hidden.txt", "shh", Some(outer.id)).await;
    app.services.files.lock_file(&ctx, hidden.id).await.unwrap();
    let folders_before = app.folder_count().await;
    let files_before = app.file_count().await;

    let duplication = &app.services.duplication;
    for password in [None, Some("wrong")] {
        let err = duplication
            .duplicate(&ctx, secret.id, ItemKind::Folder, None, password, false)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    // A locked file deeper in the subtree guards the copy too.
    let err = duplication
        .duplicate(&ctx, outer.id, ItemKind::Folder, None, None, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);

    let err = duplication
        .duplicate(&ctx, hidden.id, ItemKind::File, None, None, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert_eq!(app.folder_count().await, folders_before);
    assert_eq!(app.file_count().await, files_before);

    let result = duplication
        .duplicate(&ctx, secret.id, ItemKind::Folder, None, Some(LOCK_PASSWORD), false)
        .await
        .unwrap();
    assert_eq!(result.files_copied, 1);

    duplication
        .duplicate(&ctx, hidden.id, ItemKind::File, None, None, true)
        .await
        .unwrap();
    let verified = RequestContext::new(ctx.user_id).with_unlock_verified();
    duplication
        .duplicate(&verified, outer.id, ItemKind::Folder, None, None, false)
        .await
        .unwrap();
}
