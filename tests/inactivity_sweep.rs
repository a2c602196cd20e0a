//! The sweep that retires idle channels.

mod common;

use common::{register, test_hub};
use parlor::db::channels as channel_store;
use parlor::engine::{channels, messages, sweep};
use parlor_proto::ChannelType;

const DAY: i64 = 86_400;

async fn backdate_channel(hub: &parlor::state::Hub, channel_id: &str, days: i64) {
    let then = chrono::Utc::now().timestamp() - days * DAY;
    sqlx::query("UPDATE channels SET created_at = ? WHERE id = ?")
        .bind(then)
        .bind(channel_id)
        .execute(hub.db.pool())
        .await
        .unwrap();
}

#[tokio::test]
async fn channels_idle_past_the_window_are_retired() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;

    let stale = channels::create(&hub, &ada, "stale", ChannelType::Public)
        .await
        .unwrap();
    let fresh = channels::create(&hub, &ada, "fresh", ChannelType::Public)
        .await
        .unwrap();
    backdate_channel(&hub, &stale.id, 31).await;
    backdate_channel(&hub, &fresh.id, 29).await;

    let swept = sweep::run_once(&hub).await.unwrap();
    assert_eq!(swept, 1);

    let mut conn = hub.db.conn().await.unwrap();
    assert!(channel_store::find_active_by_id(&mut conn, &stale.id)
        .await
        .unwrap()
        .is_none());
    assert!(channel_store::find_active_by_id(&mut conn, &fresh.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn a_recent_message_keeps_an_old_channel_alive() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;

    let channel = channels::create(&hub, &ada, "old-but-busy", ChannelType::Public)
        .await
        .unwrap();
    backdate_channel(&hub, &channel.id, 90).await;
    messages::post(&hub, &ada, "old-but-busy", "still here", &[], None)
        .await
        .unwrap();

    let swept = sweep::run_once(&hub).await.unwrap();
    assert_eq!(swept, 0);

    let mut conn = hub.db.conn().await.unwrap();
    assert!(channel_store::find_active_by_id(&mut conn, &channel.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn messages_go_stale_too() {
    let hub = test_hub().await;
    let ada = register(&hub, "ada").await;

    let channel = channels::create(&hub, &ada, "ghost-town", ChannelType::Public)
        .await
        .unwrap();
    messages::post(&hub, &ada, "ghost-town", "last word", &[], None)
        .await
        .unwrap();

    backdate_channel(&hub, &channel.id, 90).await;
    let then = chrono::Utc::now().timestamp() - 31 * DAY;
    sqlx::query("UPDATE messages SET created_at = ? WHERE channel_id = ?")
        .bind(then)
        .bind(&channel.id)
        .execute(hub.db.pool())
        .await
        .unwrap();

    let swept = sweep::run_once(&hub).await.unwrap();
    assert_eq!(swept, 1);
}
