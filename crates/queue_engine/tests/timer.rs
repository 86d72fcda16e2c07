use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use queue_engine::PollTimer;
use tokio::runtime::Handle;

fn counting_timer(interval: Duration) -> (PollTimer, Arc<AtomicUsize>) {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = ticks.clone();
    let timer = PollTimer::spawn(&Handle::current(), interval, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        true
    });
    (timer, ticks)
}

#[tokio::test(start_paused = true)]
async fn first_tick_waits_one_interval() {
    let (_timer, ticks) = counting_timer(Duration::from_millis(100));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn stopped_timer_stays_silent() {
    let (timer, ticks) = counting_timer(Duration::from_millis(100));
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 1);

    timer.stop();
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn timer_ends_when_sink_is_gone() {
    let timer = PollTimer::spawn(&Handle::current(), Duration::from_millis(10), || false);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(timer.is_finished());
}
