//! Property tests: random operation sequences against the tree service.

use std::sync::Arc;

use hoard::tree::{MemoryBlobStore, NodeKind, TreeService, UploadRequest, ROOT_ID};
use hoard::HoardError;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    CreateFolder { parent: usize, name: &'static str },
    Upload { folder: usize, name: &'static str, size: usize },
    ViewFile { file: usize },
    DeleteFile { file: usize },
    DeleteFolder { folder: usize },
}

const FOLDER_NAMES: [&str; 4] = ["Docs", "docs", "Work", "2024"];
const FILE_NAMES: [&str; 4] = ["a.txt", "A.TXT", "photo.jpg", "notes"];

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), prop::sample::select(&FOLDER_NAMES[..]))
            .prop_map(|(parent, name)| Op::CreateFolder { parent, name }),
        (any::<usize>(), prop::sample::select(&FILE_NAMES[..]), 0usize..64)
            .prop_map(|(folder, name, size)| Op::Upload { folder, name, size }),
        any::<usize>().prop_map(|file| Op::ViewFile { file }),
        any::<usize>().prop_map(|file| Op::DeleteFile { file }),
        any::<usize>().prop_map(|folder| Op::DeleteFolder { folder }),
    ]
}

/// IDs the test knows to be live, mirrored alongside the service.
struct Model {
    folders: Vec<String>,
    files: Vec<String>,
}

impl Model {
    fn pick(ids: &[String], idx: usize) -> Option<String> {
        if ids.is_empty() {
            None
        } else {
            Some(ids[idx % ids.len()].clone())
        }
    }
}

fn apply(service: &TreeService, model: &mut Model, op: &Op) {
    match *op {
        Op::CreateFolder { parent, name } => {
            let parent_id = Model::pick(&model.folders, parent).unwrap();
            match service.create_folder(&parent_id, name) {
                Ok(folder) => model.folders.push(folder.id),
                Err(HoardError::Conflict(_)) => {}
                Err(e) => panic!("create_folder failed: {e}"),
            }
        }
        Op::Upload { folder, name, size } => {
            let folder_id = Model::pick(&model.folders, folder).unwrap();
            let file = service
                .create_file(UploadRequest::new(folder_id.as_str(), name, vec![7u8; size]))
                .unwrap();
            assert_eq!(file.parent_id, folder_id);
            model.files.push(file.id);
        }
        Op::ViewFile { file } => {
            if let Some(id) = Model::pick(&model.files, file) {
                let viewed = service.get_file(&id).unwrap();
                assert!(viewed.last_accessed_at.is_some());
                let top = &service.recent_files(1)[0];
                assert_eq!(top.last_activity(), viewed.last_activity());
            }
        }
        Op::DeleteFile { file } => {
            if let Some(id) = Model::pick(&model.files, file) {
                service.delete(NodeKind::File, &id).unwrap();
                model.files.retain(|f| *f != id);
                assert!(matches!(service.get_file(&id), Err(HoardError::NotFound(_))));
            }
        }
        Op::DeleteFolder { folder } => {
            let id = Model::pick(&model.folders, folder).unwrap();
            let has_children = !service.get_folder(&id).unwrap().children.is_empty();
            match service.delete(NodeKind::Folder, &id) {
                Ok(_) => {
                    assert!(!has_children);
                    model.folders.retain(|f| *f != id);
                }
                Err(HoardError::Forbidden(_)) => assert_eq!(id, ROOT_ID),
                Err(HoardError::InvalidOperation(_)) => assert!(has_children),
                Err(e) => panic!("delete_folder failed: {e}"),
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_operations_preserve_tree_invariants(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let service = TreeService::new(Arc::new(MemoryBlobStore::new()));
        let mut model = Model {
            folders: vec![ROOT_ID.to_string()],
            files: Vec::new(),
        };

        for op in &ops {
            apply(&service, &mut model, op);
            prop_assert!(service.check_invariants().is_ok(), "invariants broken after {:?}", op);

            let stats = service.stats();
            prop_assert_eq!(stats.total_files, model.files.len());
            prop_assert_eq!(stats.total_folders, model.folders.len() - 1);
        }
    }

    #[test]
    fn breadcrumbs_follow_parent_links(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let service = TreeService::new(Arc::new(MemoryBlobStore::new()));
        let mut model = Model {
            folders: vec![ROOT_ID.to_string()],
            files: Vec::new(),
        };
        for op in &ops {
            apply(&service, &mut model, op);
        }

        for id in &model.folders {
            let crumbs = service.breadcrumb(id).into_crumbs();
            prop_assert_eq!(&crumbs[0].id, ROOT_ID);
            prop_assert_eq!(&crumbs[crumbs.len() - 1].id, id);

            // Each step is the parent of the next.
            for pair in crumbs.windows(2) {
                let parent = service.parent_id_of(&pair[1].id);
                prop_assert_eq!(parent.as_deref(), Some(pair[0].id.as_str()));
            }

            // Lookups are idempotent.
            prop_assert_eq!(service.get_folder(id).unwrap(), service.get_folder(id).unwrap());
        }
    }
}
