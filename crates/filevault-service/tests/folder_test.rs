//! Integration tests for the folder hierarchy.

mod helpers;

use filevault_core::error::ErrorKind;
use filevault_service::RequestContext;

use helpers::{LOCK_PASSWORD, TestApp};

#[tokio::test]
async fn test_create_folder_defaults_and_validation() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;
    let folders = &app.services.folders;

    let folder = folders
        .create_folder(&ctx, "  Projects  ", None, None)
        .await
        .unwrap();
    assert_eq!(folder.name, "Projects");
    assert_eq!(folder.folder_color, "blue");
    assert!(!folder.is_locked);
    assert!(!folder.is_important);
    assert!(folder.is_top_level());

    let red = folders
        .create_folder(&ctx, "Urgent", Some(folder.id), Some("RED"))
        .await
        .unwrap();
    assert_eq!(red.folder_color, "red");
    assert_eq!(red.parent_id, Some(folder.id));

    // Siblings may share a name.
    folders
        .create_folder(&ctx, "Urgent", Some(folder.id), None)
        .await
        .unwrap();

    let err = folders.create_folder(&ctx, "   ", None, None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = folders
        .create_folder(&ctx, &"x".repeat(256), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = folders
        .create_folder(&ctx, "Colors", None, Some("magenta"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = folders
        .create_folder(&ctx, "Orphan", Some(9999), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_rename_and_recolor() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;
    let folder = app.folder(&ctx, "Old", None).await;

    let renamed = app
        .services
        .folders
        .rename_folder(&ctx, folder.id, " New ")
        .await
        .unwrap();
    assert_eq!(renamed.name, "New");

    let err = app
        .services
        .folders
        .rename_folder(&ctx, folder.id, "")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let green = app
        .services
        .folders
        .set_folder_color(&ctx, folder.id, "green")
        .await
        .unwrap();
    assert_eq!(green.folder_color, "green");
}

#[tokio::test]
async fn test_move_into_descendant_is_conflict() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;
    let folders = &app.services.folders;

    // 1 -> 2 -> 3
    let one = app.folder(&ctx, "one", None).await;
    let two = app.folder(&ctx, "two", Some(one.id)).await;
    let three = app.folder(&ctx, "three", Some(two.id)).await;

    let err = folders.move_folder(&ctx, one.id, Some(two.id)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = folders
        .move_folder(&ctx, one.id, Some(three.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = folders.move_folder(&ctx, one.id, Some(one.id)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    // Nothing moved.
    assert_eq!(folders.get_folder(&ctx, one.id).await.unwrap().parent_id, None);

    // Moving the deepest folder to the top level and back up is fine.
    let moved = folders.move_folder(&ctx, three.id, None).await.unwrap();
    assert!(moved.is_top_level());
    let moved = folders.move_folder(&ctx, two.id, Some(three.id)).await.unwrap();
    assert_eq!(moved.parent_id, Some(three.id));
}

/// Small deterministic generator for tree shapes.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

#[tokio::test]
async fn test_generated_trees_reject_cycles_and_chains_terminate() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;
    let folders = &app.services.folders;

    for seed in 1..=4u64 {
        let mut rng = Lcg(seed);
        // (id, parent index)
        let mut nodes: Vec<(i64, Option<usize>)> = Vec::new();
        for i in 0..10 {
            let parent = if i == 0 || rng.next(4) == 0 {
                None
            } else {
                Some(rng.next(i))
            };
            let folder = app
                .folder(&ctx, &format!("s{seed}-n{i}"), parent.map(|p| nodes[p].0))
                .await;
            nodes.push((folder.id, parent));
        }

        let is_ancestor = |anc: usize, mut node: usize| loop {
            match nodes[node].1 {
                Some(p) if p == anc => return true,
                Some(p) => node = p,
                None => return false,
            }
        };

        for a in 0..nodes.len() {
            let chain = folders.get_parent_chain(&ctx, nodes[a].0).await.unwrap();
            assert!(chain.iter().all(|f| f.id != nodes[a].0));
            assert!(chain.len() < nodes.len());

            for d in 0..nodes.len() {
                if a == d || is_ancestor(a, d) {
                    let err = folders
                        .move_folder(&ctx, nodes[a].0, Some(nodes[d].0))
                        .await
                        .unwrap_err();
                    assert_eq!(err.kind, ErrorKind::Conflict, "seed {seed}: {a} into {d}");
                }
            }
        }
    }
}

#[tokio::test]
async fn test_parent_chain_order_and_truncation() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;
    let (_, bob) = app.create_user("bob").await;
    let folders = &app.services.folders;

    let a = app.folder(&ctx, "a", None).await;
    let b = app.folder(&ctx, "b", Some(a.id)).await;
    let c = app.folder(&ctx, "c", Some(b.id)).await;

    let chain: Vec<i64> = folders
        .get_parent_chain(&ctx, c.id)
        .await
        .unwrap()
        .iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(chain, vec![a.id, b.id]);
    assert!(folders.get_parent_chain(&ctx, a.id).await.unwrap().is_empty());

    // Corrupt the hierarchy into a cycle a -> c.
    sqlx::query("UPDATE folders SET parent_id = ? WHERE id = ?")
        .bind(c.id)
        .bind(a.id)
        .execute(&app.pool)
        .await
        .unwrap();
    let chain = folders.get_parent_chain(&ctx, c.id).await.unwrap();
    assert!(chain.iter().all(|f| f.id != c.id));
    assert_eq!(chain.len(), 2);

    // A foreign ancestor ends the chain.
    let foreign = app.folder(&bob, "bob-root", None).await;
    sqlx::query("UPDATE folders SET parent_id = ? WHERE id = ?")
        .bind(foreign.id)
        .bind(a.id)
        .execute(&app.pool)
        .await
        .unwrap();
    let chain: Vec<i64> = folders
        .get_parent_chain(&ctx, c.id)
        .await
        .unwrap()
        .iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(chain, vec![a.id, b.id]);
}

#[tokio::test]
async fn test_delete_cascades_to_descendants_and_content() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;

    // Folder 10 > 11 > file a.txt
    let top = app.folder(&ctx, "top", None).await;
    let sub = app.folder(&ctx, "sub", Some(top.id)).await;
    let file = app.upload(&ctx, "a.txt", "alpha", Some(sub.id)).await;
    let keep = app.upload(&ctx, "keep.txt", "keep", None).await;
    assert_eq!(app.store.len(), 2);

    let summary = app
        .services
        .folders
        .delete_folder(&ctx, top.id)
        .await
        .unwrap();
    assert_eq!(summary.folders_removed, 2);
    assert_eq!(summary.files_removed, 1);
    assert_eq!(summary.content_failures, 0);

    for id in [top.id, sub.id] {
        let err = app.services.folders.get_folder(&ctx, id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
    let err = app.services.files.get_file(&ctx, file.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let root_files = app.services.files.list_files(&ctx, None).await.unwrap();
    assert_eq!(root_files.len(), 1);
    assert_eq!(root_files[0].id, keep.id);
    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn test_delete_removes_chain_deeper_than_cascade_limit() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;

    let top = app.folder(&ctx, "level-0", None).await;
    let mut parent = top.id;
    for level in 1..1100 {
        parent = app.folder(&ctx, &format!("level-{level}"), Some(parent)).await.id;
    }
    app.upload(&ctx, "bottom.txt", "deep", Some(parent)).await;
    let beside = app.folder(&ctx, "beside", None).await;

    let summary = app
        .services
        .folders
        .delete_folder(&ctx, top.id)
        .await
        .unwrap();
    assert_eq!(summary.folders_removed, 1100);
    assert_eq!(summary.files_removed, 1);
    assert_eq!(summary.content_failures, 0);

    assert_eq!(app.folder_count().await, 1);
    assert_eq!(app.file_count().await, 0);
    assert!(app.store.is_empty());
    app.services.folders.get_folder(&ctx, beside.id).await.unwrap();
}

#[tokio::test]
async fn test_lock_is_idempotent_and_unlock_requires_password() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user_with_lock("alice").await;
    let folders = &app.services.folders;
    let folder = app.folder(&ctx, "Private", None).await;

    let err = folders
        .unlock_folder(&ctx, folder.id, Some(LOCK_PASSWORD), false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotApplicable);

    assert!(folders.lock_folder(&ctx, folder.id).await.unwrap().is_locked);
    assert!(folders.lock_folder(&ctx, folder.id).await.unwrap().is_locked);

    for attempt in [None, Some(""), Some("wrong")] {
        let err = folders
            .unlock_folder(&ctx, folder.id, attempt, false)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }

    let unlocked = folders
        .unlock_folder(&ctx, folder.id, Some(LOCK_PASSWORD), false)
        .await
        .unwrap();
    assert!(!unlocked.is_locked);

    folders.lock_folder(&ctx, folder.id).await.unwrap();
    let unlocked = folders
        .unlock_folder(&ctx, folder.id, None, true)
        .await
        .unwrap();
    assert!(!unlocked.is_locked);

    folders.lock_folder(&ctx, folder.id).await.unwrap();
    let verified = ctx.clone().with_unlock_verified();
    let unlocked = folders
        .unlock_folder(&verified, folder.id, None, false)
        .await
        .unwrap();
    assert!(!unlocked.is_locked);
}

#[tokio::test]
async fn test_unlock_without_configured_lock_password_fails() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;
    let folder = app.folder(&ctx, "Private", None).await;
    app.services.folders.lock_folder(&ctx, folder.id).await.unwrap();

    let err = app
        .services
        .folders
        .unlock_folder(&ctx, folder.id, Some("anything"), false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
}

#[tokio::test]
async fn test_contents_hide_locked_children() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user_with_lock("alice").await;
    let folders = &app.services.folders;

    let parent = app.folder(&ctx, "parent", None).await;
    let open = app.folder(&ctx, "open", Some(parent.id)).await;
    let hidden = app.folder(&ctx, "hidden", Some(parent.id)).await;
    folders.lock_folder(&ctx, hidden.id).await.unwrap();

    let visible_file = app.upload(&ctx, "visible.txt", "v", Some(parent.id)).await;
    let secret = app.upload(&ctx, "secret.txt", "s", Some(parent.id)).await;
    app.services.files.lock_file(&ctx, secret.id).await.unwrap();

    let contents = folders
        .get_folder_with_contents(&ctx, parent.id, None)
        .await
        .unwrap();
    assert_eq!(contents.folder.id, parent.id);
    let sub_ids: Vec<i64> = contents.subfolders.iter().map(|f| f.id).collect();
    assert_eq!(sub_ids, vec![open.id]);
    let file_ids: Vec<i64> = contents.files.iter().map(|f| f.id).collect();
    assert_eq!(file_ids, vec![visible_file.id]);

    // A locked folder needs the password to be opened.
    let err = folders
        .get_folder_with_contents(&ctx, hidden.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    folders
        .get_folder_with_contents(&ctx, hidden.id, Some(LOCK_PASSWORD))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_toggle_important_and_list_order() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;
    let (_, bob) = app.create_user("bob").await;
    let folders = &app.services.folders;

    let first = app.folder(&ctx, "first", None).await;
    let second = app.folder(&ctx, "second", None).await;
    app.folder(&bob, "bobs", None).await;

    assert!(folders.toggle_important(&ctx, first.id).await.unwrap());
    assert!(!folders.toggle_important(&ctx, first.id).await.unwrap());
    assert!(folders.toggle_important(&ctx, first.id).await.unwrap());

    let listed: Vec<i64> = folders
        .list_folders(&ctx, None)
        .await
        .unwrap()
        .iter()
        .map(|f| f.id)
        .collect();
    assert_eq!(listed, vec![second.id, first.id]);

    // Lock state and important flag are independent.
    folders.lock_folder(&ctx, first.id).await.unwrap();
    let folder = folders.get_folder(&ctx, first.id).await.unwrap();
    assert!(folder.is_locked && folder.is_important);
}

#[tokio::test]
async fn test_existence_is_checked_before_ownership() {
    let app = TestApp::new().await;
    let (_, alice) = app.create_user("alice").await;
    let (_, bob) = app.create_user("bob").await;
    let folders = &app.services.folders;

    let owned_by_alice = app.folder(&alice, "mine", None).await;

    let err = folders.get_folder(&bob, 424242).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = folders.get_folder(&bob, owned_by_alice.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = folders
        .rename_folder(&bob, owned_by_alice.id, "stolen")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = folders.delete_folder(&bob, owned_by_alice.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let bobs = app.folder(&bob, "bobs", None).await;
    let err = folders
        .move_folder(&bob, bobs.id, Some(owned_by_alice.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = folders
        .create_folder(&bob, "child", Some(owned_by_alice.id), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_tree_counts() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;

    let root = app.folder(&ctx, "root", None).await;
    let a = app.folder(&ctx, "a", Some(root.id)).await;
    let b = app.folder(&ctx, "b", Some(root.id)).await;
    app.folder(&ctx, "a1", Some(a.id)).await;
    app.upload(&ctx, "r.txt", "r", Some(root.id)).await;
    app.upload(&ctx, "b1.txt", "b", Some(b.id)).await;
    app.upload(&ctx, "b2.txt", "b", Some(b.id)).await;

    let tree = app.services.folders.get_tree(&ctx, root.id).await.unwrap();
    assert_eq!(tree.id, root.id);
    assert_eq!(tree.depth, 0);
    assert_eq!(tree.total_folders(), 4);
    assert_eq!(tree.total_files(), 3);
    assert_eq!(tree.height(), 3);

    let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(tree.children[0].children[0].depth, 2);

    let other = RequestContext::new(ctx.user_id + 100);
    let err = app.services.folders.get_tree(&other, root.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_docs_taxes_scenario() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;
    let folders = &app.services.folders;

    let docs = app.folder(&ctx, "Docs", None).await;
    let taxes = app.folder(&ctx, "Taxes", Some(docs.id)).await;

    let err = folders.move_folder(&ctx, docs.id, Some(taxes.id)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    app.upload(&ctx, "a.txt", "receipt", Some(taxes.id)).await;
    folders.delete_folder(&ctx, docs.id).await.unwrap();

    let err = folders.get_folder(&ctx, taxes.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let remaining = app.services.files.list_files(&ctx, None).await.unwrap();
    assert!(remaining.iter().all(|f| f.name != "a.txt"));
    assert_eq!(app.file_count().await, 0);
}
