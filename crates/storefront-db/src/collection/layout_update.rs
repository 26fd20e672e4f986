//! # Layout Update Collection
//!
//! Filterable set of layout updates, scoped through the link table.
//!
//! ## Join Bookkeeping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  filter_by_theme(3) ──┐                                                 │
//! │  filter_by_store(1) ──┼──► joined_with_link?  no ─► INNER JOIN link    │
//! │  filter_by_theme(4) ──┘                      yes ─► reuse it           │
//! │                                                                         │
//! │  filter_by_no_links() ───► joined_left_with_link? no ─► LEFT JOIN link │
//! │                                                   yes ─► reuse it      │
//! │                                                                         │
//! │  The two flags are independent and live on this instance only;        │
//! │  a new collection starts with both cleared.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use storefront_core::datetime;
use storefront_core::LayoutUpdate;
use tracing::debug;

use crate::collection::select::{QueryOperator, Select, SortOrder};
use crate::collection::{CollectionEvent, CollectionObserver, LoadPhase, Observers};
use crate::error::DbResult;
use crate::repository::layout_update::{LayoutUpdateDeleter, LayoutUpdateResource};

/// Main table of the collection.
pub const LAYOUT_UPDATE_TABLE: &str = "core_layout_update";

/// Link table joined for theme/store scoping.
pub const LAYOUT_LINK_TABLE: &str = "core_layout_link";

/// Prefix of the events emitted around load.
pub const EVENT_PREFIX: &str = "layout_update_collection";

const LINK_ALIAS: &str = "link";
const LINK_ON: &str = "link.layout_update_id = main_table.layout_update_id";

/// Layout updates matching the filters applied so far.
///
/// Filters take `&mut self` and return `&mut Self` so they chain:
///
/// ```rust,ignore
/// let mut updates = db.layout_update_collection();
/// updates.filter_by_theme(3).filter_by_store(1);
/// let items = updates.load().await?;
/// ```
///
/// `D` performs the per-row delete for [`delete_all`](Self::delete_all).
#[derive(Debug)]
pub struct LayoutUpdateCollection<D = LayoutUpdateResource> {
    pool: SqlitePool,
    deleter: D,
    select: Select,
    joined_with_link: bool,
    joined_left_with_link: bool,
    observers: Observers,
    items: Vec<LayoutUpdate>,
    loaded: bool,
}

impl<D: LayoutUpdateDeleter> LayoutUpdateCollection<D> {
    /// Creates an unfiltered collection.
    pub fn new(pool: SqlitePool, deleter: D) -> Self {
        LayoutUpdateCollection {
            pool,
            deleter,
            select: Select::from(LAYOUT_UPDATE_TABLE),
            joined_with_link: false,
            joined_left_with_link: false,
            observers: Observers::default(),
            items: Vec::new(),
            loaded: false,
        }
    }

    /// Registers an observer for the load events.
    pub fn observe(&mut self, observer: Arc<dyn CollectionObserver>) -> &mut Self {
        self.observers.push(observer);
        self
    }

    /// Keeps updates linked to `theme_id`.
    pub fn filter_by_theme(&mut self, theme_id: i64) -> &mut Self {
        self.join_with_link();
        self.select
            .filter("link.theme_id", QueryOperator::Eq(theme_id.into()));
        self
    }

    /// Keeps updates linked to `store_id`.
    pub fn filter_by_store(&mut self, store_id: i64) -> &mut Self {
        self.join_with_link();
        self.select
            .filter("link.store_id", QueryOperator::Eq(store_id.into()));
        self
    }

    /// Keeps updates last touched strictly more than `days` days ago.
    ///
    /// Rows with no `updated_at` are excluded.
    pub fn filter_by_updated_before(&mut self, days: u32) -> &mut Self {
        self.filter_by_updated_before_at(days, datetime::now())
    }

    /// Same as [`filter_by_updated_before`](Self::filter_by_updated_before),
    /// counting the days back from `now` instead of the clock.
    pub fn filter_by_updated_before_at(&mut self, days: u32, now: NaiveDateTime) -> &mut Self {
        let cutoff = datetime::cutoff_days_before(now, days);
        debug!(days, cutoff = %cutoff, "Filtering layout updates by age");

        self.select
            .filter("main_table.updated_at", QueryOperator::NotNull)
            .filter("main_table.updated_at", QueryOperator::Lt(cutoff.into()));
        self
    }

    /// Keeps updates that have no link rows at all.
    ///
    /// `extra_fields` are link columns to project alongside the update; they
    /// only take effect on the first call, when the left join is added.
    pub fn filter_by_no_links(&mut self, extra_fields: &[&str]) -> &mut Self {
        self.join_left_with_link(extra_fields);
        self.select
            .filter("link.layout_update_id", QueryOperator::IsNull);
        self
    }

    /// Orders the result. Without it rows come back in storage order.
    pub fn set_order(&mut self, column: &str, direction: SortOrder) -> &mut Self {
        self.select.order_by(column, direction);
        self
    }

    /// Caps the number of rows loaded.
    pub fn set_limit(&mut self, limit: Option<i64>) -> &mut Self {
        self.select.limit(limit);
        self
    }

    /// The query built so far.
    pub fn select(&self) -> &Select {
        &self.select
    }

    fn join_with_link(&mut self) {
        if !self.joined_with_link {
            self.select
                .join(LAYOUT_LINK_TABLE, LINK_ALIAS, LINK_ON, &["store_id", "theme_id"]);
            self.joined_with_link = true;
        }
    }

    fn join_left_with_link(&mut self, fields: &[&str]) {
        if !self.joined_left_with_link {
            self.select
                .left_join(LAYOUT_LINK_TABLE, LINK_ALIAS, LINK_ON, fields);
            self.joined_left_with_link = true;
        }
    }

    /// Runs the query once and caches the rows, one per layout update.
    ///
    /// Later calls return the cached rows without touching the database.
    pub async fn load(&mut self) -> DbResult<&[LayoutUpdate]> {
        if self.loaded {
            return Ok(&self.items);
        }

        self.observers.dispatch(&CollectionEvent {
            prefix: EVENT_PREFIX,
            phase: LoadPhase::Before,
            item_count: 0,
        });

        let mut query = self.select.build();
        debug!(sql = %query.sql(), "Loading layout update collection");

        let mut items = query
            .build_query_as::<LayoutUpdate>()
            .fetch_all(&self.pool)
            .await?;

        // The link join yields one row per matching link; keep the first per update
        let mut seen = HashSet::with_capacity(items.len());
        items.retain(|update| seen.insert(update.layout_update_id));

        self.items = items;
        self.loaded = true;

        self.observers.dispatch(&CollectionEvent {
            prefix: EVENT_PREFIX,
            phase: LoadPhase::After,
            item_count: self.items.len(),
        });

        debug!(count = self.items.len(), "Layout update collection loaded");
        Ok(&self.items)
    }

    /// Loaded rows; empty until [`load`](Self::load) has run.
    pub fn items(&self) -> &[LayoutUpdate] {
        &self.items
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Deletes every update in the collection, one entity at a time.
    ///
    /// Loads first if needed. Stops at the first failing delete; rows
    /// already deleted stay deleted.
    pub async fn delete_all(&mut self) -> DbResult<&mut Self> {
        self.load().await?;

        debug!(count = self.items.len(), "Deleting layout updates");

        for update in &self.items {
            self.deleter.delete(update).await?;
        }

        Ok(self)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::select::JoinKind;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use storefront_core::Store;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn insert_update(db: &Database, handle: &str, updated_days_ago: Option<i64>) -> LayoutUpdate {
        let updated_at = updated_days_ago.map(|days| datetime::now() - Duration::days(days));
        db.layout_updates()
            .insert(&LayoutUpdate::new(handle, "<block/>").with_updated_at(updated_at))
            .await
            .unwrap()
    }

    fn handles(items: &[LayoutUpdate]) -> Vec<String> {
        let mut handles: Vec<String> = items.iter().map(|u| u.handle.clone()).collect();
        handles.sort();
        handles
    }

    /// Records the ids it is asked to delete without touching the database.
    #[derive(Default)]
    struct SpyDeleter {
        deleted: Mutex<Vec<i64>>,
        calls: AtomicUsize,
    }

    impl LayoutUpdateDeleter for &SpyDeleter {
        async fn delete(&self, update: &LayoutUpdate) -> DbResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.deleted.lock().unwrap().push(update.layout_update_id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_theme_filter_joins_once() {
        let db = setup().await;
        let mut once = db.layout_update_collection();
        once.filter_by_theme(1);

        let mut twice = db.layout_update_collection();
        twice.filter_by_theme(1).filter_by_theme(1);

        assert_eq!(
            once.select().join_count(JoinKind::Inner, LAYOUT_LINK_TABLE),
            twice.select().join_count(JoinKind::Inner, LAYOUT_LINK_TABLE)
        );
        assert_eq!(twice.select().joins().len(), 1);
    }

    #[tokio::test]
    async fn test_mixed_filters_share_one_inner_join() {
        let db = setup().await;
        let mut collection = db.layout_update_collection();
        collection
            .filter_by_store(1)
            .filter_by_theme(2)
            .filter_by_store(3)
            .filter_by_theme(4);

        assert_eq!(collection.select().join_count(JoinKind::Inner, LAYOUT_LINK_TABLE), 1);
        assert_eq!(collection.select().filters().len(), 4);
    }

    #[tokio::test]
    async fn test_new_collection_resets_join_flags() {
        let db = setup().await;
        let mut first = db.layout_update_collection();
        first.filter_by_theme(1);

        let second = db.layout_update_collection();
        assert!(second.select().joins().is_empty());
    }

    #[tokio::test]
    async fn test_filter_by_theme_and_store() {
        let db = setup().await;
        let header = insert_update(&db, "header", None).await;
        let footer = insert_update(&db, "footer", None).await;
        insert_update(&db, "unlinked", None).await;

        let links = db.layout_updates();
        links.add_link(header.layout_update_id, 1, 0).await.unwrap();
        links.add_link(footer.layout_update_id, 2, 0).await.unwrap();

        let mut by_theme = db.layout_update_collection();
        by_theme.filter_by_theme(1).filter_by_store(0);
        let items = by_theme.load().await.unwrap();

        assert_eq!(handles(items), vec!["header"]);
        assert_eq!(items[0].theme_id, Some(1));
        assert_eq!(items[0].store_id, Some(0));
    }

    #[tokio::test]
    async fn test_filter_by_updated_before() {
        let db = setup().await;
        insert_update(&db, "ancient", Some(40)).await;
        insert_update(&db, "recent", Some(2)).await;
        insert_update(&db, "never_touched", None).await;

        let mut stale = db.layout_update_collection();
        stale.filter_by_updated_before(30);
        let items = stale.load().await.unwrap();

        assert_eq!(handles(items), vec!["ancient"]);
    }

    #[tokio::test]
    async fn test_zero_days_excludes_future_rows() {
        let db = setup().await;
        // An update stamped in the future is never older than the cutoff
        let future = datetime::now() + Duration::days(1);
        db.layout_updates()
            .insert(&LayoutUpdate::new("future", "").with_updated_at(Some(future)))
            .await
            .unwrap();

        let mut stale = db.layout_update_collection();
        stale.filter_by_updated_before(0);
        assert!(stale.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_updated_before_cutoff_is_exclusive() {
        let db = setup().await;
        let now = datetime::parse_datetime("2026-10-19 12:00:00").unwrap();
        let cutoff = datetime::days_before(now, 7);

        for (handle, stamp) in [
            ("before_cutoff", cutoff - Duration::seconds(1)),
            ("at_cutoff", cutoff),
            ("after_cutoff", cutoff + Duration::seconds(1)),
        ] {
            db.layout_updates()
                .insert(&LayoutUpdate::new(handle, "").with_updated_at(Some(stamp)))
                .await
                .unwrap();
        }

        let mut stale = db.layout_update_collection();
        stale.filter_by_updated_before_at(7, now);

        assert_eq!(handles(stale.load().await.unwrap()), vec!["before_cutoff"]);
    }

    #[tokio::test]
    async fn test_update_linked_in_two_stores_loads_once() {
        let db = setup().await;
        let group = db.store_groups().create(1, "Main", 2).await.unwrap();
        let mut store = Store::new("store_a", 1, group.group_id);
        db.stores().save(&mut store).await.unwrap();
        let store_a = store.store_id.unwrap();

        let shared = insert_update(&db, "shared", Some(40)).await;
        db.layout_updates().add_link(shared.layout_update_id, 1, 0).await.unwrap();
        db.layout_updates().add_link(shared.layout_update_id, 1, store_a).await.unwrap();

        let mut by_theme = db.layout_update_collection();
        by_theme.filter_by_theme(1);
        assert_eq!(by_theme.load().await.unwrap().len(), 1);

        let mut stale = db.layout_update_collection();
        stale.filter_by_theme(1).filter_by_updated_before(30);
        stale.delete_all().await.unwrap();

        assert_eq!(db.layout_updates().count().await.unwrap(), 0);
        assert!(db.layout_updates().links_for(shared.layout_update_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_by_no_links() {
        let db = setup().await;
        let orphan = insert_update(&db, "orphan", None).await;
        let linked = insert_update(&db, "linked", None).await;
        db.layout_updates().add_link(linked.layout_update_id, 1, 0).await.unwrap();

        let mut orphans = db.layout_update_collection();
        orphans.filter_by_no_links(&[]);
        assert_eq!(handles(orphans.load().await.unwrap()), vec!["orphan"]);

        // Linking the orphan takes it out of a fresh query
        db.layout_updates().add_link(orphan.layout_update_id, 1, 0).await.unwrap();

        let mut orphans = db.layout_update_collection();
        orphans.filter_by_no_links(&[]);
        assert!(orphans.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_links_left_join_is_idempotent() {
        let db = setup().await;
        let mut collection = db.layout_update_collection();
        collection
            .filter_by_no_links(&["theme_id"])
            .filter_by_no_links(&["store_id"]);

        assert_eq!(collection.select().join_count(JoinKind::Left, LAYOUT_LINK_TABLE), 1);
        assert_eq!(collection.select().joins()[0].columns, vec!["theme_id".to_string()]);
    }

    #[tokio::test]
    async fn test_stale_orphans_combined() {
        let db = setup().await;
        insert_update(&db, "stale_orphan", Some(60)).await;
        let stale_linked = insert_update(&db, "stale_linked", Some(60)).await;
        insert_update(&db, "fresh_orphan", Some(1)).await;
        db.layout_updates()
            .add_link(stale_linked.layout_update_id, 1, 0)
            .await
            .unwrap();

        let mut collection = db.layout_update_collection();
        collection.filter_by_updated_before(30).filter_by_no_links(&[]);

        assert_eq!(handles(collection.load().await.unwrap()), vec!["stale_orphan"]);
    }

    #[tokio::test]
    async fn test_order_and_limit() {
        let db = setup().await;
        for (handle, sort_order) in [("b", 2), ("a", 1), ("c", 3)] {
            let mut update = LayoutUpdate::new(handle, "");
            update.sort_order = sort_order;
            db.layout_updates().insert(&update).await.unwrap();
        }

        let mut collection = db.layout_update_collection();
        collection
            .set_order("main_table.sort_order", SortOrder::Desc)
            .set_limit(Some(2));
        let items = collection.load().await.unwrap();

        let ordered: Vec<&str> = items.iter().map(|u| u.handle.as_str()).collect();
        assert_eq!(ordered, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_load_emits_events() {
        let db = setup().await;
        insert_update(&db, "header", None).await;

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();

        let mut collection = db.layout_update_collection();
        collection.observe(Arc::new(move |event: &CollectionEvent| {
            sink.lock().unwrap().push((event.name(), event.item_count));
        }));
        collection.load().await.unwrap();
        // Cached: no second round of events
        collection.load().await.unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                ("layout_update_collection_load_before".to_string(), 0),
                ("layout_update_collection_load_after".to_string(), 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_all_deletes_each_entity() {
        let db = setup().await;
        let mut expected = Vec::new();
        for handle in ["one", "two", "three"] {
            expected.push(insert_update(&db, handle, None).await.layout_update_id);
        }

        let spy = SpyDeleter::default();
        let mut collection = LayoutUpdateCollection::new(db.pool().clone(), &spy);
        collection.delete_all().await.unwrap();

        assert_eq!(spy.calls.load(Ordering::SeqCst), 3);
        let mut deleted = spy.deleted.lock().unwrap().clone();
        deleted.sort();
        expected.sort();
        assert_eq!(deleted, expected);
        assert!(collection.is_loaded());
        assert_eq!(collection.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_all_removes_rows() {
        let db = setup().await;
        let keep = insert_update(&db, "keep", None).await;
        db.layout_updates().add_link(keep.layout_update_id, 1, 0).await.unwrap();
        insert_update(&db, "drop_a", None).await;
        insert_update(&db, "drop_b", None).await;

        let mut orphans = db.layout_update_collection();
        orphans.filter_by_no_links(&[]).delete_all().await.unwrap();

        assert_eq!(db.layout_updates().count().await.unwrap(), 1);
        assert!(db.layout_updates().get_by_id(keep.layout_update_id).await.unwrap().is_some());
    }
}
