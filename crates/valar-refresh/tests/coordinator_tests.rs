/*
[INPUT]:  RefreshCoordinator scenarios on a paused Tokio clock
[OUTPUT]: Timer, dispatch, busy-state and persistence verification
[POS]:    Integration test layer - coordinator behavior
[UPDATE]: When changing timer arming, dispatch or persistence semantics
*/

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{CallCounter, EPSILON, UnavailableStore};
use tempfile::TempDir;
use tokio::time::sleep;
use valar_refresh::{
    JsonFileStore, MemoryStore, RefreshCallback, RefreshConfig, RefreshCoordinator, RefreshRoute,
    Route,
};

const INTERVAL: Duration = Duration::from_millis(1_000);

fn coordinator_with_interval(interval: Duration) -> RefreshCoordinator {
    let coordinator = RefreshCoordinator::new(Arc::new(MemoryStore::new()));
    coordinator.set_interval_ms(interval.as_millis() as u64);
    coordinator
}

async fn exploding_fetch() {
    panic!("fetch exploded");
}

#[tokio::test(start_paused = true)]
async fn test_tick_invokes_callback_once_per_interval() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_current_page(Route::Positions);
    let counter = CallCounter::new();
    let _registration = coordinator.register(RefreshRoute::Positions, counter.detached(Duration::ZERO));

    sleep(INTERVAL * 3 + EPSILON).await;
    assert_eq!(counter.count(), 3);

    sleep(INTERVAL * 2).await;
    assert_eq!(counter.count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_dropped_outside_refreshable_pages() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_current_page(Route::Settings);
    let counter = CallCounter::new();
    for route in RefreshRoute::ALL {
        let _ = coordinator.register(route, counter.detached(Duration::ZERO));
    }

    sleep(INTERVAL * 5 + EPSILON).await;
    assert_eq!(counter.count(), 0);
    assert!(!coordinator.is_refreshing());
    assert!(coordinator.is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_ticks_only_reach_the_current_page() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_current_page(Route::Orders);
    let orders = CallCounter::new();
    let positions = CallCounter::new();
    let _ = coordinator.register(RefreshRoute::Orders, orders.detached(Duration::ZERO));
    let _ = coordinator.register(RefreshRoute::Positions, positions.detached(Duration::ZERO));

    sleep(INTERVAL * 2 + EPSILON).await;
    assert_eq!(orders.count(), 2);
    assert_eq!(positions.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_disable_halts_ticks_but_keeps_page_and_callbacks() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_current_page(Route::Dashboard);
    let counter = CallCounter::new();
    let _ = coordinator.register(RefreshRoute::Dashboard, counter.detached(Duration::ZERO));

    sleep(INTERVAL * 2 + EPSILON).await;
    assert_eq!(counter.count(), 2);

    coordinator.set_enabled(false);
    assert!(!coordinator.is_armed());
    sleep(INTERVAL * 4).await;
    assert_eq!(counter.count(), 2);
    assert_eq!(coordinator.current_page(), Some(Route::Dashboard));
    assert!(coordinator.registry().is_registered(RefreshRoute::Dashboard));

    coordinator.set_enabled(true);
    sleep(INTERVAL + EPSILON).await;
    assert_eq!(counter.count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_page_change_restarts_timer_phase() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_current_page(Route::Positions);
    let counter = CallCounter::new();
    let _ = coordinator.register(RefreshRoute::Orders, counter.detached(Duration::ZERO));

    sleep(Duration::from_millis(700)).await;
    coordinator.set_current_page(Route::Orders);

    // The old timer would have fired at 1000 ms.
    sleep(Duration::from_millis(500)).await;
    assert_eq!(counter.count(), 0);

    sleep(Duration::from_millis(500) + EPSILON).await;
    assert_eq!(counter.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_interval_change_rebuilds_timer() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_current_page(Route::Positions);
    let counter = CallCounter::new();
    let _ = coordinator.register(RefreshRoute::Positions, counter.detached(Duration::ZERO));

    coordinator.set_interval_ms(120_000);
    sleep(INTERVAL * 10).await;
    assert_eq!(counter.count(), 0);

    coordinator.set_interval_ms(250);
    sleep(Duration::from_millis(1_000) + EPSILON).await;
    assert_eq!(counter.count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_manual_trigger_busy_window_is_fixed() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_enabled(false);
    coordinator.set_current_page(Route::Orders);
    let counter = CallCounter::new();
    let _ = coordinator.register(RefreshRoute::Orders, counter.detached(Duration::from_secs(5)));

    coordinator.trigger_refresh();
    assert!(coordinator.is_refreshing());

    sleep(EPSILON).await;
    assert_eq!(counter.count(), 1);

    sleep(Duration::from_millis(989)).await;
    assert!(coordinator.is_refreshing());

    sleep(Duration::from_millis(2)).await;
    assert!(!coordinator.is_refreshing());
    assert_eq!(counter.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_triggers_extend_busy_window() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_enabled(false);
    coordinator.set_current_page(Route::Positions);
    let counter = CallCounter::new();
    let _ = coordinator.register(RefreshRoute::Positions, counter.detached(Duration::ZERO));

    coordinator.trigger_refresh();
    sleep(Duration::from_millis(600)).await;
    coordinator.trigger_refresh();

    sleep(Duration::from_millis(600)).await;
    assert!(coordinator.is_refreshing());

    sleep(Duration::from_millis(400) + EPSILON).await;
    assert!(!coordinator.is_refreshing());
    assert_eq!(counter.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_trigger_without_callback_only_flickers() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_enabled(false);
    coordinator.set_current_page(Route::Dashboard);

    coordinator.trigger_refresh();
    assert!(coordinator.is_refreshing());
    assert_eq!(coordinator.in_flight(), 0);

    sleep(Duration::from_millis(1_000) + EPSILON).await;
    assert!(!coordinator.is_refreshing());
}

#[tokio::test(start_paused = true)]
async fn test_tracked_callback_busy_until_completion() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_enabled(false);
    coordinator.set_current_page(Route::Positions);
    let counter = CallCounter::new();
    let _ = coordinator.register(
        RefreshRoute::Positions,
        counter.tracked(Duration::from_millis(3_000)),
    );

    coordinator.trigger_refresh();
    assert!(coordinator.is_refreshing());
    assert_eq!(coordinator.in_flight(), 1);

    sleep(Duration::from_millis(2_000)).await;
    assert!(coordinator.is_refreshing());

    sleep(Duration::from_millis(1_000) + EPSILON).await;
    assert!(!coordinator.is_refreshing());
    assert_eq!(coordinator.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_overlap_slow_fetches() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_current_page(Route::Orders);
    let counter = CallCounter::new();
    let _ = coordinator.register(
        RefreshRoute::Orders,
        counter.tracked(Duration::from_millis(2_500)),
    );

    sleep(INTERVAL * 3 + EPSILON).await;
    assert_eq!(counter.count(), 3);
    assert_eq!(coordinator.in_flight(), 3);

    coordinator.set_enabled(false);
    sleep(Duration::from_secs(3)).await;
    assert_eq!(coordinator.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_callback_is_contained() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_enabled(false);
    coordinator.set_current_page(Route::Dashboard);
    let _ = coordinator.register(RefreshRoute::Dashboard, RefreshCallback::tracked(exploding_fetch));

    coordinator.trigger_refresh();
    sleep(EPSILON).await;

    assert_eq!(coordinator.in_flight(), 0);
    assert!(!coordinator.is_refreshing());

    coordinator.set_enabled(true);
    assert!(coordinator.is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_released_registration_stops_dispatch() {
    let coordinator = coordinator_with_interval(INTERVAL);
    coordinator.set_current_page(Route::Positions);
    let counter = CallCounter::new();
    let guard = coordinator
        .register(RefreshRoute::Positions, counter.detached(Duration::ZERO))
        .into_guard();

    sleep(INTERVAL + EPSILON).await;
    assert_eq!(counter.count(), 1);

    drop(guard);
    sleep(INTERVAL * 3).await;
    assert_eq!(counter.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_settings_persist_across_reconstruction() {
    let tmp_dir = TempDir::new().unwrap();
    let path = tmp_dir.path().join("settings.json");

    {
        let coordinator = RefreshCoordinator::new(Arc::new(JsonFileStore::new(path.clone())));
        assert_eq!(coordinator.config(), RefreshConfig::default());
        coordinator.set_enabled(false);
        coordinator.set_interval_ms(120_000);
    }

    let restored = RefreshCoordinator::new(Arc::new(JsonFileStore::new(path)));
    assert_eq!(
        restored.config(),
        RefreshConfig {
            enabled: false,
            interval_ms: 120_000,
        }
    );
    assert!(!restored.is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_storage_falls_back_to_memory() {
    let coordinator = RefreshCoordinator::new(Arc::new(UnavailableStore));
    assert_eq!(coordinator.config(), RefreshConfig::default());
    assert!(coordinator.is_armed());

    coordinator.set_enabled(false);
    coordinator.set_interval_ms(30_000);
    assert_eq!(
        coordinator.config(),
        RefreshConfig {
            enabled: false,
            interval_ms: 30_000,
        }
    );
    assert!(!coordinator.is_armed());
}
