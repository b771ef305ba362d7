use super::*;

#[tokio::test]
async fn subscriber_receives_published_events_in_order() {
    let feed: Feed<u32> = Feed::default();
    let mut sub = feed.subscribe();
    assert_eq!(feed.publish(1), 1);
    assert_eq!(feed.publish(2), 1);
    assert_eq!(sub.next().await, Some(1));
    assert_eq!(sub.next().await, Some(2));
}

#[tokio::test]
async fn publish_without_subscribers_is_noop() {
    let feed: Feed<u32> = Feed::new(4);
    assert_eq!(feed.publish(7), 0);
}

#[tokio::test]
async fn events_before_subscribe_are_not_seen() {
    let feed: Feed<u32> = Feed::new(4);
    let mut early = feed.subscribe();
    feed.publish(1);
    let mut late = feed.subscribe();
    feed.publish(2);
    assert_eq!(early.next().await, Some(1));
    assert_eq!(late.next().await, Some(2));
}

#[test]
fn release_unsubscribes() {
    let feed: Feed<u32> = Feed::new(4);
    let sub = feed.subscribe();
    let other = feed.subscribe();
    assert_eq!(feed.subscriber_count(), 2);
    sub.release();
    assert_eq!(feed.subscriber_count(), 1);
    drop(other);
    assert_eq!(feed.subscriber_count(), 0);
    assert_eq!(feed.publish(3), 0);
}

#[tokio::test]
async fn next_matching_skips_other_events() {
    let feed: Feed<u32> = Feed::new(8);
    let mut sub = feed.subscribe();
    for n in [1, 3, 4, 5] {
        feed.publish(n);
    }
    assert_eq!(sub.next_matching(|n| n % 2 == 0).await, Some(4));
    assert_eq!(sub.next().await, Some(5));
}

#[tokio::test]
async fn closed_feed_ends_subscription() {
    let feed: Feed<u32> = Feed::new(4);
    let mut sub = feed.subscribe();
    drop(feed);
    assert_eq!(sub.next().await, None);
}

#[tokio::test]
async fn lagged_subscriber_resumes_with_newest() {
    let feed: Feed<u32> = Feed::new(2);
    let mut sub = feed.subscribe();
    for n in 0..5 {
        feed.publish(n);
    }
    // Capacity 2 keeps only the last two events.
    assert_eq!(sub.next().await, Some(3));
    assert_eq!(sub.next().await, Some(4));
}

#[tokio::test]
async fn recv_reports_the_gap_before_resuming() {
    let feed: Feed<u32> = Feed::new(2);
    let mut sub = feed.subscribe();
    for n in 0..5 {
        feed.publish(n);
    }
    assert_eq!(sub.recv().await, Delivery::Missed(3));
    assert_eq!(sub.recv().await, Delivery::Event(3));
    drop(feed);
    assert_eq!(sub.recv().await, Delivery::Event(4));
    assert_eq!(sub.recv().await, Delivery::Closed);
}
