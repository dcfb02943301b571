use std::sync::Arc;
use voyage_booking::{BookingLifecycleStore, BookingReconciler, RoomAvailabilityResolver, SailingCatalog};
use voyage_core::{RecordStore, RoomClaims};
use voyage_layout::LayoutOptions;
use voyage_store::app_config::{BookingRules, LayoutConfig};

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<RoomAvailabilityResolver>,
    pub reconciler: Arc<BookingReconciler>,
    pub lifecycle: Arc<BookingLifecycleStore>,
    pub catalog: Arc<SailingCatalog>,
    pub layout: LayoutOptions,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        claims: Arc<dyn RoomClaims>,
        rules: &BookingRules,
        layout: &LayoutConfig,
    ) -> Self {
        Self {
            resolver: Arc::new(
                RoomAvailabilityResolver::new(store.clone()).with_ship_scope(rules.ship_scoped_rooms),
            ),
            reconciler: Arc::new(
                BookingReconciler::new(store.clone(), claims)
                    .with_policy(rules.multi_room_policy)
                    .with_ship_scope(rules.ship_scoped_rooms),
            ),
            lifecycle: Arc::new(BookingLifecycleStore::new(store.clone())),
            catalog: Arc::new(SailingCatalog::new(store)),
            layout: LayoutOptions {
                page_capacity: layout.page_capacity,
                title: layout.title.clone(),
                currency_symbol: layout.currency_symbol.clone(),
            },
        }
    }
}
