//! Use-case orchestration flows over in-memory adapters.

use doctree::error::EngineError;
use doctree::events::{DocUnitEvent, EventBus, EventKind};
use doctree::store::{
    ActiveUnitStore, IdGenerator, MediaStore, MemActiveUnitStore, MemDocUnitStore,
};
use doctree::tree::ops::{collect_parent_index, find_node};
use doctree::tree::{AssetPointer, NodeKind, PointerStatus};
use doctree::types::{AssetId, UnitId};
use doctree::usecase::{
    CreateFolderRequest, DocUnitService, FolderPlacement, HierarchyService, MoveNodesRequest,
    SelectNodesRequest,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct SeqIds {
    counter: AtomicUsize,
}

impl IdGenerator for SeqIds {
    fn generate(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("id-{n}")
    }
}

/// Media stub that fabricates temporary pointers without touching disk.
struct StubMedia;

impl MediaStore for StubMedia {
    fn import_temporary(&self, source_path: &Path) -> Result<AssetPointer, EngineError> {
        let stem = source_path
            .file_stem()
            .expect("stub import needs a file name")
            .to_string_lossy();
        Ok(AssetPointer {
            asset_id: AssetId::new(format!("asset-{stem}")).unwrap(),
            resolver: "doc_media".to_string(),
            status: PointerStatus::Temporary,
            path_hint: Some(format!("temp/doc_units/{stem}.png")),
        })
    }

    fn promote(&self, pointer: &AssetPointer) -> Result<AssetPointer, EngineError> {
        Ok(pointer.clone())
    }

    fn resolve_path(&self, pointer: &AssetPointer) -> Result<PathBuf, EngineError> {
        Ok(PathBuf::from(pointer.path_hint.clone().unwrap_or_default()))
    }

    fn list_final_assets(&self) -> Result<Vec<String>, EngineError> {
        Ok(Vec::new())
    }

    fn delete_asset(&self, _path_hint: &str) -> Result<(), EngineError> {
        Ok(())
    }

    fn cleanup_temporary(&self) {}
}

struct Harness {
    store: Arc<MemDocUnitStore>,
    active: Arc<MemActiveUnitStore>,
    seen: Arc<Mutex<Vec<DocUnitEvent>>>,
    hierarchy: HierarchyService,
    units: DocUnitService,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemDocUnitStore::new());
        let active = Arc::new(MemActiveUnitStore::new());
        let ids = Arc::new(SeqIds {
            counter: AtomicUsize::new(0),
        });
        let events = Arc::new(EventBus::new());

        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in [
            EventKind::HierarchyLoaded,
            EventKind::HierarchyUpdated,
            EventKind::HierarchySelectionChanged,
            EventKind::DocUnitListUpdated,
            EventKind::ActiveDocUnitChanged,
            EventKind::ProjectDirtyStateChanged,
        ] {
            let sink = seen.clone();
            events.subscribe(kind, move |event| sink.lock().push(event.clone()));
        }

        let hierarchy = HierarchyService::new(
            store.clone(),
            active.clone(),
            ids.clone(),
            events.clone(),
        );
        let units = DocUnitService::new(
            store.clone(),
            active.clone(),
            ids,
            Arc::new(StubMedia),
            events,
        );

        Harness {
            store,
            active,
            seen,
            hierarchy,
            units,
        }
    }

    fn current_root(&self) -> doctree::tree::HierarchyNode {
        use doctree::store::HierarchyRepository;
        let unit_id = self.active.get().expect("active unit");
        self.store.get_hierarchy(&unit_id).unwrap()
    }

    fn updates(&self) -> Vec<(Vec<String>, doctree::tree::HierarchyNode)> {
        self.seen
            .lock()
            .iter()
            .filter_map(|event| match event {
                DocUnitEvent::HierarchyUpdated {
                    changed_node_ids,
                    root,
                    ..
                } => Some((changed_node_ids.clone(), root.clone())),
                _ => None,
            })
            .collect()
    }

    fn clear_events(&self) {
        self.seen.lock().clear();
    }
}

#[test]
fn mutations_without_an_active_unit_are_rejected() {
    let harness = Harness::new();

    assert!(matches!(
        harness.hierarchy.load(),
        Err(EngineError::NoActiveUnit)
    ));
    assert!(matches!(
        harness.hierarchy.rename("any", "Name"),
        Err(EngineError::NoActiveUnit)
    ));
    assert!(matches!(
        harness.hierarchy.create_folder(CreateFolderRequest {
            anchor_node_id: None,
            placement: FolderPlacement::Child,
            name: "New".to_string(),
        }),
        Err(EngineError::NoActiveUnit)
    ));
}

#[test]
fn create_unit_activates_and_publishes_the_event_triplet() {
    let harness = Harness::new();
    let unit = harness.units.create("Volume 1").unwrap();

    assert_eq!(harness.active.get(), Some(unit.unit_id.clone()));
    assert!(unit.hierarchy.is_folder());
    assert_eq!(unit.hierarchy.node_id, format!("{}-root", unit.unit_id));
    assert!(unit.created_at.is_some());

    let kinds: Vec<EventKind> = harness.seen.lock().iter().map(DocUnitEvent::kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::DocUnitListUpdated,
            EventKind::ActiveDocUnitChanged,
            EventKind::ProjectDirtyStateChanged,
        ]
    );
}

#[test]
fn load_announces_the_current_tree() {
    let harness = Harness::new();
    let unit = harness.units.create("Volume 1").unwrap();
    harness.clear_events();

    let root = harness.hierarchy.load().unwrap();
    assert_eq!(root, unit.hierarchy);

    let events = harness.seen.lock();
    assert!(matches!(
        &events[0],
        DocUnitEvent::HierarchyLoaded { unit_id, .. } if unit_id == unit.unit_id.as_str()
    ));
}

#[test]
fn create_folder_without_anchor_appends_under_root() {
    let harness = Harness::new();
    harness.units.create("Volume 1").unwrap();
    harness.clear_events();

    let folder = harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: None,
            placement: FolderPlacement::Child,
            name: "Chapter 1".to_string(),
        })
        .unwrap();

    let root = harness.current_root();
    assert_eq!(root.children.last().unwrap().node_id, folder.node_id);

    let updates = harness.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, vec![folder.node_id.clone()]);
}

#[test]
fn create_folder_sibling_placement_lands_at_anchor_position() {
    let harness = Harness::new();
    harness.units.create("Volume 1").unwrap();
    let first = harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: None,
            placement: FolderPlacement::Child,
            name: "Chapter 1".to_string(),
        })
        .unwrap();

    let sibling = harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: Some(first.node_id.clone()),
            placement: FolderPlacement::Sibling,
            name: "Prologue".to_string(),
        })
        .unwrap();

    let root = harness.current_root();
    let (parents, indices) = collect_parent_index(&root);
    assert_eq!(
        parents[sibling.node_id.as_str()].unwrap().node_id,
        root.node_id
    );
    assert_eq!(indices[sibling.node_id.as_str()], 0);
    assert_eq!(indices[first.node_id.as_str()], 1);
}

#[test]
fn create_folder_child_placement_rejects_asset_anchor() {
    let harness = Harness::new();
    let unit = harness.units.create("Volume 1").unwrap();
    let updated = harness
        .units
        .import_asset(&unit.unit_id, Path::new("scans/page.png"))
        .unwrap();
    let asset_id = updated.hierarchy.children.last().unwrap().node_id.clone();

    let err = harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: Some(asset_id),
            placement: FolderPlacement::Child,
            name: "Nested".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));
}

#[test]
fn rename_is_validated_at_the_orchestration_layer() {
    let harness = Harness::new();
    harness.units.create("Volume 1").unwrap();
    let folder = harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: None,
            placement: FolderPlacement::Child,
            name: "Chapter 1".to_string(),
        })
        .unwrap();
    harness.clear_events();

    assert!(matches!(
        harness.hierarchy.rename("ghost", "Anything"),
        Err(EngineError::NotFound(_))
    ));
    assert!(harness.updates().is_empty());

    harness.hierarchy.rename(&folder.node_id, "Chapter One").unwrap();
    let root = harness.current_root();
    assert_eq!(
        find_node(&root, &folder.node_id).unwrap().name,
        "Chapter One"
    );
    assert_eq!(harness.updates()[0].0, vec![folder.node_id.clone()]);
}

#[test]
fn delete_reports_the_requested_ids_not_descendants() {
    let harness = Harness::new();
    harness.units.create("Volume 1").unwrap();
    let outer = harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: None,
            placement: FolderPlacement::Child,
            name: "Outer".to_string(),
        })
        .unwrap();
    let inner = harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: Some(outer.node_id.clone()),
            placement: FolderPlacement::Child,
            name: "Inner".to_string(),
        })
        .unwrap();
    harness.clear_events();

    harness.hierarchy.delete(&[outer.node_id.clone()]).unwrap();

    let root = harness.current_root();
    assert!(find_node(&root, &outer.node_id).is_none());
    assert!(find_node(&root, &inner.node_id).is_none());
    assert_eq!(harness.updates()[0].0, vec![outer.node_id.clone()]);
}

#[test]
fn empty_delete_and_move_are_no_ops() {
    let harness = Harness::new();
    harness.units.create("Volume 1").unwrap();
    harness.clear_events();

    harness.hierarchy.delete(&[]).unwrap();
    harness
        .hierarchy
        .move_nodes(MoveNodesRequest {
            node_ids: vec![],
            target_parent_id: "anywhere".to_string(),
            insert_index: 0,
            as_copy: false,
        })
        .unwrap();

    assert!(harness.seen.lock().is_empty());
}

#[test]
fn move_copy_reports_the_minted_ids() {
    let harness = Harness::new();
    harness.units.create("Volume 1").unwrap();
    let source = harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: None,
            placement: FolderPlacement::Child,
            name: "Source".to_string(),
        })
        .unwrap();
    let target = harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: None,
            placement: FolderPlacement::Child,
            name: "Target".to_string(),
        })
        .unwrap();
    harness.clear_events();

    harness
        .hierarchy
        .move_nodes(MoveNodesRequest {
            node_ids: vec![source.node_id.clone()],
            target_parent_id: target.node_id.clone(),
            insert_index: 0,
            as_copy: true,
        })
        .unwrap();

    let updates = harness.updates();
    assert_eq!(updates.len(), 1);
    let (changed, root) = &updates[0];
    assert_eq!(changed.len(), 1);
    assert_ne!(changed[0], source.node_id);

    // Original stays in place, copy lands under the target.
    assert!(find_node(root, &source.node_id).is_some());
    let copy = find_node(root, &changed[0]).unwrap();
    assert_eq!(copy.name, "Source");
    let (parents, _) = collect_parent_index(root);
    assert_eq!(
        parents[changed[0].as_str()].unwrap().node_id,
        target.node_id
    );
}

#[test]
fn move_deduplicates_requested_ids_in_the_change_set() {
    let harness = Harness::new();
    harness.units.create("Volume 1").unwrap();
    let folder = harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: None,
            placement: FolderPlacement::Child,
            name: "Chapter".to_string(),
        })
        .unwrap();
    harness.clear_events();

    let root_id = harness.current_root().node_id;
    harness
        .hierarchy
        .move_nodes(MoveNodesRequest {
            node_ids: vec![folder.node_id.clone(), folder.node_id.clone()],
            target_parent_id: root_id,
            insert_index: 0,
            as_copy: false,
        })
        .unwrap();

    assert_eq!(harness.updates()[0].0, vec![folder.node_id.clone()]);
}

#[test]
fn select_validates_prepends_primary_and_never_persists() {
    let harness = Harness::new();
    harness.units.create("Volume 1").unwrap();
    let a = harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: None,
            placement: FolderPlacement::Child,
            name: "A".to_string(),
        })
        .unwrap();
    let b = harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: None,
            placement: FolderPlacement::Child,
            name: "B".to_string(),
        })
        .unwrap();
    let before = harness.current_root();
    harness.clear_events();

    assert!(matches!(
        harness.hierarchy.select(SelectNodesRequest {
            primary_node_id: Some("ghost".to_string()),
            selected_node_ids: vec![],
        }),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        harness.hierarchy.select(SelectNodesRequest {
            primary_node_id: None,
            selected_node_ids: vec![a.node_id.clone(), "ghost".to_string()],
        }),
        Err(EngineError::NotFound(_))
    ));

    harness
        .hierarchy
        .select(SelectNodesRequest {
            primary_node_id: Some(a.node_id.clone()),
            selected_node_ids: vec![b.node_id.clone()],
        })
        .unwrap();

    let events = harness.seen.lock();
    let selection = events
        .iter()
        .find_map(|event| match event {
            DocUnitEvent::HierarchySelectionChanged {
                selected_node_ids, ..
            } => Some(selected_node_ids.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(selection, vec![a.node_id.clone(), b.node_id.clone()]);
    assert!(!events
        .iter()
        .any(|event| event.kind() == EventKind::HierarchyUpdated));
    drop(events);

    assert_eq!(harness.current_root(), before);
}

#[test]
fn import_asset_appends_as_last_root_child() {
    let harness = Harness::new();
    let unit = harness.units.create("Volume 1").unwrap();
    harness
        .hierarchy
        .create_folder(CreateFolderRequest {
            anchor_node_id: None,
            placement: FolderPlacement::Child,
            name: "Chapter".to_string(),
        })
        .unwrap();

    let updated = harness
        .units
        .import_asset(&unit.unit_id, Path::new("scans/page.png"))
        .unwrap();

    let imported = updated.hierarchy.children.last().unwrap();
    assert_eq!(imported.kind, NodeKind::Asset);
    assert_eq!(imported.name, "page");
    let pointer = imported.pointer.as_ref().unwrap();
    assert_eq!(pointer.status, PointerStatus::Temporary);
}

#[test]
fn deleting_the_active_unit_clears_the_selection() {
    let harness = Harness::new();
    let first = harness.units.create("Volume 1").unwrap();
    let second = harness.units.create("Volume 2").unwrap();

    // Deleting an inactive unit leaves the active pointer alone.
    harness.units.delete(&first.unit_id).unwrap();
    assert_eq!(harness.active.get(), Some(second.unit_id.clone()));

    harness.clear_events();
    harness.units.delete(&second.unit_id).unwrap();
    assert!(harness.active.get().is_none());

    let kinds: Vec<EventKind> = harness.seen.lock().iter().map(DocUnitEvent::kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::ActiveDocUnitChanged,
            EventKind::DocUnitListUpdated,
            EventKind::ProjectDirtyStateChanged,
        ]
    );
}

#[test]
fn set_active_announces_the_change() {
    let harness = Harness::new();
    let unit = harness.units.create("Volume 1").unwrap();
    harness.units.set_active(None);
    assert!(harness.active.get().is_none());

    harness.clear_events();
    harness.units.set_active(Some(unit.unit_id.clone()));
    assert_eq!(harness.active.get(), Some(unit.unit_id.clone()));
    assert!(matches!(
        harness.seen.lock().last().unwrap(),
        DocUnitEvent::ActiveDocUnitChanged { unit_id: Some(id) } if id == unit.unit_id.as_str()
    ));
}

#[test]
fn rename_unit_refreshes_the_unit_list() {
    let harness = Harness::new();
    let unit = harness.units.create("Volume 1").unwrap();
    harness.clear_events();

    let renamed = harness.units.rename(&unit.unit_id, "Volume One").unwrap();
    assert_eq!(renamed.name.as_str(), "Volume One");
    assert_eq!(harness.units.list().unwrap()[0].name.as_str(), "Volume One");

    let unknown = UnitId::new("ghost").unwrap();
    assert!(matches!(
        harness.units.rename(&unknown, "X"),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        harness.units.rename(&unit.unit_id, "   "),
        Err(EngineError::Validation(_))
    ));
}
