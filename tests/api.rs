mod helpers;

use chrono::{Duration, Utc};
use helpers::setup::{spawn_app, TestApp};
use nudge_api_structs::*;
use nudge_domain::{Channel, EntityType, ReminderKind, ID};
use reqwest::StatusCode;
use serde_json::json;

fn recurring_body(entity_id: &ID) -> serde_json::Value {
    json!({
        "userId": ID::default().to_string(),
        "entityId": entity_id.to_string(),
        "entityType": "habit",
        "type": "recurring",
        "scheduledTime": "09:00",
        "daysOfWeek": [1, 3, 5],
        "notificationTypes": ["push", "email"],
        "message": "Drink water"
    })
}

async fn create_reminder(app: &TestApp, body: &serde_json::Value) -> reqwest::Response {
    app.client
        .post(app.url("/reminders"))
        .json(body)
        .send()
        .await
        .expect("Expected request to be sent")
}

#[actix_web::test]
async fn test_status_ok() {
    let app = spawn_app().await;
    let res = app
        .client
        .get(app.url("/healthcheck"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_reminder_lifecycle() {
    let app = spawn_app().await;
    let entity_id = ID::default();

    let mut body = recurring_body(&entity_id);
    body["intervalEnabled"] = json!(true);
    body["intervalMinutes"] = json!(60);
    body["intervalStartTime"] = json!("09:00");
    body["intervalEndTime"] = json!("18:00");
    let res = create_reminder(&app, &body).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = res.json::<create_reminder::APIResponse>().await.unwrap();
    let reminder = created.reminder;
    assert_eq!(reminder.kind, ReminderKind::Recurring);
    assert_eq!(reminder.days_of_week, vec![1, 3, 5]);
    assert_eq!(reminder.notification_types, vec![Channel::Push, Channel::Email]);
    assert_eq!(reminder.interval.interval_minutes, Some(60));
    assert!(reminder.next_scheduled_at.is_some());

    let res = app
        .client
        .get(app.url(&format!("/reminders/{}", reminder.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .client
        .put(app.url(&format!("/reminders/{}", reminder.id)))
        .json(&json!({ "daysOfWeek": [0], "version": reminder.version }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated = res.json::<update_reminder::APIResponse>().await.unwrap();
    assert_eq!(updated.reminder.days_of_week, vec![0]);
    assert_eq!(updated.reminder.version, reminder.version + 1);

    // Stale version
    let res = app
        .client
        .put(app.url(&format!("/reminders/{}", reminder.id)))
        .json(&json!({ "message": "Stretch", "version": reminder.version }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .client
        .get(app.url(&format!("/entities/habit/{}/reminders", entity_id)))
        .send()
        .await
        .unwrap();
    let listed = res.json::<get_entity_reminders::APIResponse>().await.unwrap();
    assert_eq!(listed.reminders.len(), 1);

    let res = app
        .client
        .get(app.url(&format!("/entities/habit/{}/reminders/summary", entity_id)))
        .send()
        .await
        .unwrap();
    let summary = res
        .json::<get_entity_reminder_summary::APIResponse>()
        .await
        .unwrap()
        .summary;
    assert_eq!(summary.total, 1);
    assert_eq!(summary.remaining_capacity, 4);
    assert_eq!(summary.interval_reminders.len(), 1);
    assert_eq!(summary.interval_reminders[0].slots_per_day, 9);
    assert_eq!(summary.summary, "1 reminder: 1 main, 1 interval");

    let res = app
        .client
        .delete(app.url(&format!("/reminders/{}", reminder.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = app
        .client
        .get(app.url(&format!("/reminders/{}", reminder.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_rejects_sixth_active_reminder() {
    let app = spawn_app().await;
    let entity_id = ID::default();
    for _ in 0..5 {
        let res = create_reminder(&app, &recurring_body(&entity_id)).await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = create_reminder(&app, &recurring_body(&entity_id)).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .client
        .get(app.url(&format!("/entities/habit/{}/reminders", entity_id)))
        .send()
        .await
        .unwrap();
    let listed = res.json::<get_entity_reminders::APIResponse>().await.unwrap();
    assert_eq!(listed.reminders.len(), 5);
}

#[actix_web::test]
async fn test_rejects_invalid_reminders() {
    let app = spawn_app().await;
    let entity_id = ID::default();

    let mut no_channels = recurring_body(&entity_id);
    no_channels["notificationTypes"] = json!([]);
    let mut no_days = recurring_body(&entity_id);
    no_days["daysOfWeek"] = json!([]);
    let mut invalid_time = recurring_body(&entity_id);
    invalid_time["scheduledTime"] = json!("24:30");
    let mut reversed_interval = recurring_body(&entity_id);
    reversed_interval["intervalEnabled"] = json!(true);
    reversed_interval["intervalMinutes"] = json!(30);
    reversed_interval["intervalStartTime"] = json!("18:00");
    reversed_interval["intervalEndTime"] = json!("09:00");
    let mut past_single = recurring_body(&entity_id);
    past_single["type"] = json!("single");
    past_single["reminderDate"] = json!("2020-01-01");

    for body in [no_channels, no_days, invalid_time, reversed_interval, past_single] {
        let res = create_reminder(&app, &body).await;
        assert!(res.status().is_client_error());
    }

    let res = app
        .client
        .get(app.url(&format!("/entities/habit/{}/reminders", entity_id)))
        .send()
        .await
        .unwrap();
    let listed = res.json::<get_entity_reminders::APIResponse>().await.unwrap();
    assert!(listed.reminders.is_empty());
}

#[actix_web::test]
async fn test_appointment_reminders_and_sync() {
    let app = spawn_app().await;
    let entity_id = ID::default();
    let user_id = ID::default();
    let tomorrow = Utc::now().date_naive() + Duration::days(1);

    let res = app
        .client
        .post(app.url(&format!("/entities/task/{}/sync", entity_id)))
        .json(&json!({
            "userId": user_id.to_string(),
            "dueAt": null,
            "appointment": {
                "date": tomorrow.to_string(),
                "time": "14:00",
                "preparationMinutes": 15
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .client
        .get(app.url(&format!("/entities/task/{}/appointment-reminders", entity_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let derived = res
        .json::<get_appointment_reminders::APIResponse>()
        .await
        .unwrap()
        .appointment_reminders
        .expect("Expected appointment reminders");
    assert_eq!(derived.prepare.time.to_string(), "13:20");
    assert_eq!(derived.urgent.time.to_string(), "13:30");
    assert_eq!(derived.appointment_at - derived.urgent.remind_at, 30 * 60 * 1000);

    // A before due reminder without due date never fires until the task is synced
    let res = create_reminder(
        &app,
        &json!({
            "userId": user_id.to_string(),
            "entityId": entity_id.to_string(),
            "entityType": "task",
            "type": "before_due",
            "minutesBefore": 30,
            "notificationTypes": ["sms"]
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let reminder = res.json::<create_reminder::APIResponse>().await.unwrap().reminder;
    assert_eq!(reminder.entity_type, EntityType::Task);
    assert_eq!(reminder.next_scheduled_at, None);

    let due_at = (Utc::now() + Duration::days(2)).timestamp_millis();
    let res = app
        .client
        .post(app.url(&format!("/entities/task/{}/sync", entity_id)))
        .json(&json!({ "userId": user_id.to_string(), "dueAt": due_at }))
        .send()
        .await
        .unwrap();
    let synced = res.json::<sync_entity::APIResponse>().await.unwrap();
    assert_eq!(synced.reminders.len(), 1);
    assert_eq!(
        synced.reminders[0].next_scheduled_at,
        Some(due_at - 30 * 60 * 1000)
    );

    let res = app
        .client
        .get(app.url("/reminders/upcoming?limit=10"))
        .send()
        .await
        .unwrap();
    let upcoming = res
        .json::<get_upcoming_reminders::APIResponse>()
        .await
        .unwrap();
    assert!(upcoming.reminders.iter().any(|r| r.id == reminder.id));
}

#[actix_web::test]
async fn test_deleting_entity_removes_its_reminders() {
    let app = spawn_app().await;
    let entity_id = ID::default();
    for _ in 0..2 {
        let res = create_reminder(&app, &recurring_body(&entity_id)).await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = app
        .client
        .delete(app.url(&format!("/entities/habit/{}", entity_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let deleted = res.json::<delete_entity::APIResponse>().await.unwrap();
    assert_eq!(deleted.deleted_reminders, 2);

    let res = app
        .client
        .get(app.url(&format!("/entities/habit/{}/reminders", entity_id)))
        .send()
        .await
        .unwrap();
    let listed = res.json::<get_entity_reminders::APIResponse>().await.unwrap();
    assert!(listed.reminders.is_empty());
}

#[actix_web::test]
async fn test_manual_scheduler_run() {
    let app = spawn_app().await;
    assert!(!app.config.scheduler_enabled);

    let res = app
        .client
        .post(app.url("/scheduler/run"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let tick = res.json::<run_scheduler::APIResponse>().await.unwrap().tick;
    assert_eq!(tick.selected, 0);

    let res = app
        .client
        .get(app.url("/scheduler/stats"))
        .send()
        .await
        .unwrap();
    let stats = res
        .json::<get_scheduler_stats::APIResponse>()
        .await
        .unwrap()
        .stats;
    assert_eq!(stats.ticks, 1);
    assert!(!stats.is_running);
    assert_eq!(stats.last_run_at, Some(tick.ran_at));
    assert_eq!(stats.next_run_at, None);
}
