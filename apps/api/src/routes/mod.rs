pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::billing::handlers as billing;
use crate::generation::{assist, handlers as generation};
use crate::library::{brand_voice, captions, schedule, social};
use crate::research::handlers as research;
use crate::signups::handlers as signups;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Account and billing
        .route("/api/user", get(billing::handle_get_user))
        .route("/api/stripe-webhook", post(billing::handle_stripe_webhook))
        // Generation
        .route(
            "/api/generate-caption",
            post(generation::handle_generate_caption),
        )
        .route(
            "/api/generate-caption-vision",
            post(generation::handle_generate_caption_vision),
        )
        .route("/api/generate-hooks", post(assist::handle_generate_hooks))
        .route("/api/analyze-caption", post(assist::handle_analyze_caption))
        .route("/api/boost-caption", post(assist::handle_boost_caption))
        // Library
        .route("/api/captions", get(captions::handle_list_captions))
        .route("/api/captions/:id", delete(captions::handle_delete_caption))
        .route(
            "/api/brand-voices",
            get(brand_voice::handle_get_brand_voice).post(brand_voice::handle_save_brand_voice),
        )
        .route(
            "/api/schedule-post",
            get(schedule::handle_list_scheduled).post(schedule::handle_schedule_post),
        )
        .route(
            "/api/social-connections",
            get(social::handle_list_connections),
        )
        .route(
            "/api/social-connections/:id",
            delete(social::handle_delete_connection),
        )
        // Research
        .route(
            "/api/research/analyze-competitor",
            post(research::handle_analyze_competitor),
        )
        // Pre-launch sign-ups
        .route("/api/waitlist", post(signups::handle_join_waitlist))
        .route("/api/beta", post(signups::handle_beta_signup))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request, http::StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::billing::tier::Tier;
    use crate::billing::webhook::WebhookVerifier;
    use crate::db::memory::MemoryStore;
    use crate::test_support::{
        authed, authed_json, body_json, test_app, ScriptedProvider, WEBHOOK_SECRET,
    };

    const REPLY: &str = "CAPTION: Golden hour, golden brew ☕\nHASHTAGS: #coffee #sunset #goldenhour";

    fn caption_body() -> serde_json::Value {
        json!({
            "description": "A sunset photo of coffee",
            "tone": "casual",
            "platform": ["instagram"]
        })
    }

    fn set_usage(store: &MemoryStore, user_id: Uuid, count: i32, days_ago: i64) {
        let mut user = store.user(user_id).unwrap();
        user.daily_caption_count = count;
        user.last_reset_date = Some(Utc::now() - Duration::days(days_ago));
        store.put_user(user);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = test_app(
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedProvider::replying(REPLY)),
        );
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["service"], "captionflow-api");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = test_app(
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedProvider::replying(REPLY)),
        );
        let response = app
            .oneshot(
                Request::post("/api/generate-caption")
                    .header("content-type", "application/json")
                    .body(Body::from(caption_body().to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_free_user_generates_and_lists_caption() {
        let store = Arc::new(MemoryStore::new());
        let user_id = store.insert_user("free@example.com", Tier::Free);
        let app = test_app(store.clone(), Arc::new(ScriptedProvider::replying(REPLY)));

        let response = app
            .clone()
            .oneshot(authed_json("POST", "/api/generate-caption", user_id, caption_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["caption"]["content"], "Golden hour, golden brew ☕");
        assert_eq!(body["caption"]["hashtags"], json!(["coffee", "sunset", "goldenhour"]));
        assert_eq!(body["remainingToday"], 9);
        assert_eq!(body["tier"], "free");

        let response = app
            .clone()
            .oneshot(authed("GET", "/api/captions", user_id))
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed["captions"].as_array().unwrap().len(), 1);
        assert_eq!(listed["captions"][0]["id"], body["caption"]["id"]);

        let response = app
            .oneshot(authed("GET", "/api/user", user_id))
            .await
            .unwrap();
        let account = body_json(response).await;
        assert_eq!(account["user"]["dailyCaptionCount"], 1);
        assert_eq!(account["remainingToday"], 9);
    }

    #[tokio::test]
    async fn test_exhausted_quota_is_rejected_before_generation() {
        let store = Arc::new(MemoryStore::new());
        let user_id = store.insert_user("free@example.com", Tier::Free);
        set_usage(&store, user_id, 10, 0);
        let llm = Arc::new(ScriptedProvider::replying(REPLY));
        let app = test_app(store.clone(), llm.clone());

        let response = app
            .oneshot(authed_json("POST", "/api/generate-caption", user_id, caption_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["code"], "QUOTA_EXCEEDED");
        assert_eq!(llm.calls(), 0);
        assert_eq!(store.caption_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_counter_resets_on_first_request_of_the_day() {
        let store = Arc::new(MemoryStore::new());
        let user_id = store.insert_user("free@example.com", Tier::Free);
        set_usage(&store, user_id, 10, 1);
        let app = test_app(store.clone(), Arc::new(ScriptedProvider::replying(REPLY)));

        let response = app
            .oneshot(authed_json("POST", "/api/generate-caption", user_id, caption_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["remainingToday"], 9);
        assert_eq!(store.user(user_id).unwrap().daily_caption_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_tone_is_validation_error() {
        let store = Arc::new(MemoryStore::new());
        let user_id = store.insert_user("free@example.com", Tier::Free);
        let app = test_app(store, Arc::new(ScriptedProvider::replying(REPLY)));

        let response = app
            .oneshot(authed_json(
                "POST",
                "/api/generate-caption",
                user_id,
                json!({ "description": "A sunset photo", "tone": "sarcastic", "platform": ["instagram"] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_brand_voice_gated_for_free_and_saved_for_pro() {
        let store = Arc::new(MemoryStore::new());
        let free_id = store.insert_user("free@example.com", Tier::Free);
        let pro_id = store.insert_user("pro@example.com", Tier::Pro);
        let app = test_app(store, Arc::new(ScriptedProvider::replying(REPLY)));
        let body = json!({ "examples": ["Rise and grind ☕", "Monday fuel"], "selectedTone": "witty" });

        let response = app
            .clone()
            .oneshot(authed_json("POST", "/api/brand-voices", free_id, body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await["error"],
            "Brand voice training requires Pro subscription"
        );

        let response = app
            .clone()
            .oneshot(authed_json("POST", "/api/brand-voices", pro_id, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(authed("GET", "/api/brand-voices", pro_id))
            .await
            .unwrap();
        let saved = body_json(response).await;
        assert_eq!(saved["brandVoice"]["selectedTone"], "witty");
        assert_eq!(saved["brandVoice"]["examples"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_schedule_rejects_past_time_for_every_tier() {
        let store = Arc::new(MemoryStore::new());
        let free_id = store.insert_user("free@example.com", Tier::Free);
        let pro_id = store.insert_user("pro@example.com", Tier::Pro);
        let app = test_app(store, Arc::new(ScriptedProvider::replying(REPLY)));
        let body = json!({
            "captionId": Uuid::new_v4(),
            "scheduledAt": (Utc::now() - Duration::hours(1)).to_rfc3339(),
            "publishPlatforms": ["instagram"]
        });

        for user_id in [free_id, pro_id] {
            let response = app
                .clone()
                .oneshot(authed_json("POST", "/api/schedule-post", user_id, body.clone()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(response).await["error"],
                "Scheduled time must be in the future"
            );
        }
    }

    #[tokio::test]
    async fn test_schedule_owned_caption() {
        let store = Arc::new(MemoryStore::new());
        let pro_id = store.insert_user("pro@example.com", Tier::Pro);
        let other_id = store.insert_user("other@example.com", Tier::Pro);
        let app = test_app(store, Arc::new(ScriptedProvider::replying(REPLY)));

        let generated = body_json(
            app.clone()
                .oneshot(authed_json("POST", "/api/generate-caption", pro_id, caption_body()))
                .await
                .unwrap(),
        )
        .await;
        assert!(generated["remainingToday"].is_null());
        let body = json!({
            "captionId": generated["caption"]["id"],
            "scheduledAt": (Utc::now() + Duration::days(1)).to_rfc3339(),
            "publishPlatforms": ["instagram", "twitter"]
        });

        let response = app
            .clone()
            .oneshot(authed_json("POST", "/api/schedule-post", other_id, body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(authed_json("POST", "/api/schedule-post", pro_id, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let scheduled = body_json(response).await;
        assert_eq!(scheduled["scheduled"]["status"], "scheduled");
        assert_eq!(scheduled["scheduled"]["platforms"], json!(["instagram", "twitter"]));

        let response = app
            .oneshot(authed("GET", "/api/schedule-post", pro_id))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["captions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_caption_scoped_to_owner() {
        let store = Arc::new(MemoryStore::new());
        let owner = store.insert_user("owner@example.com", Tier::Free);
        let stranger = store.insert_user("stranger@example.com", Tier::Free);
        let app = test_app(store.clone(), Arc::new(ScriptedProvider::replying(REPLY)));

        let generated = body_json(
            app.clone()
                .oneshot(authed_json("POST", "/api/generate-caption", owner, caption_body()))
                .await
                .unwrap(),
        )
        .await;
        let uri = format!("/api/captions/{}", generated["caption"]["id"].as_str().unwrap());

        let response = app
            .clone()
            .oneshot(authed("DELETE", &uri, stranger))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(store.caption_count(), 1);

        let response = app.oneshot(authed("DELETE", &uri, owner)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.caption_count(), 0);
    }

    #[tokio::test]
    async fn test_research_requires_paid_tier() {
        let store = Arc::new(MemoryStore::new());
        let free_id = store.insert_user("free@example.com", Tier::Free);
        let llm = Arc::new(ScriptedProvider::replying("{}"));
        let app = test_app(store, llm.clone());

        let response = app
            .oneshot(authed_json(
                "POST",
                "/api/research/analyze-competitor",
                free_id,
                json!({
                    "captions": ["first caption", "second caption", "third caption"],
                    "platform": "instagram",
                    "niche": "coffee"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["code"], "UPGRADE_REQUIRED");
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_boost_falls_back_to_input_on_empty_output() {
        let store = Arc::new(MemoryStore::new());
        let user_id = store.insert_user("free@example.com", Tier::Free);
        let app = test_app(store, Arc::new(ScriptedProvider::replying("   ")));

        let response = app
            .oneshot(authed_json(
                "POST",
                "/api/boost-caption",
                user_id,
                json!({ "caption": "Coffee at sunset", "platform": ["instagram"], "tone": "casual" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["boostedCaption"], "Coffee at sunset");
    }

    #[tokio::test]
    async fn test_fractional_viral_score_is_rounded() {
        let store = Arc::new(MemoryStore::new());
        let user_id = store.insert_user("free@example.com", Tier::Free);
        let reply = json!({
            "score": 72.5,
            "breakdown": { "hook": 80.2, "flow": 64.5, "cta": 71 },
            "feedback": ["Strong hook", "Dense middle", "Add a question"],
            "suggestion": "End with a question."
        })
        .to_string();
        let app = test_app(store, Arc::new(ScriptedProvider::replying(&reply)));

        let response = app
            .oneshot(authed_json(
                "POST",
                "/api/analyze-caption",
                user_id,
                json!({ "caption": "Coffee at sunset", "platform": ["instagram"] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let analysis = body_json(response).await;
        assert_eq!(analysis["score"], 73);
        assert_eq!(analysis["breakdown"]["hook"], 80);
        assert_eq!(analysis["breakdown"]["flow"], 65);
    }

    fn public_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_waitlist_joins_once_per_email() {
        let store = Arc::new(MemoryStore::new());
        let app = test_app(store.clone(), Arc::new(ScriptedProvider::replying(REPLY)));
        let entry = json!({ "email": "ana@example.com", "handle": "@ana", "platform": "tiktok" });

        let response = app
            .clone()
            .oneshot(public_json("/api/waitlist", entry))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(response).await["message"],
            "Successfully joined the waitlist!"
        );

        let response = app
            .clone()
            .oneshot(public_json(
                "/api/waitlist",
                json!({ "email": " ANA@example.com", "handle": "@ana2", "platform": "instagram" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["code"], "CONFLICT");
        assert_eq!(body["error"], "This email is already on the waitlist.");

        for bad in [
            json!({ "email": "not-an-email", "handle": "@bo", "platform": "tiktok" }),
            json!({ "email": "bo@example.com", "handle": "  ", "platform": "tiktok" }),
            json!({ "email": "bo@example.com", "handle": "@bo" }),
        ] {
            let response = app
                .clone()
                .oneshot(public_json("/api/waitlist", bad))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(store.waitlist_len(), 1);
    }

    #[tokio::test]
    async fn test_beta_signup_issues_one_invite_per_email() {
        let store = Arc::new(MemoryStore::new());
        let app = test_app(store.clone(), Arc::new(ScriptedProvider::replying(REPLY)));

        let response = app
            .clone()
            .oneshot(public_json("/api/beta", json!({ "email": "early@example.com" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Beta invite sent! Check your email.");

        let signups = store.beta_signups();
        assert_eq!(signups.len(), 1);
        assert_eq!(signups[0].status, "pending");
        assert_eq!(signups[0].invite_code.len(), 16);

        let response = app
            .clone()
            .oneshot(public_json("/api/beta", json!({ "email": "early@example.com" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(response).await["error"],
            "Email already registered for beta"
        );

        let response = app
            .oneshot(public_json("/api/beta", json!({ "email": "nope" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Valid email is required");
        assert_eq!(store.beta_signups().len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_signature_and_upgrade() {
        let store = Arc::new(MemoryStore::new());
        let user_id = store.insert_user("free@example.com", Tier::Free);
        let app = test_app(store.clone(), Arc::new(ScriptedProvider::replying(REPLY)));
        let payload = json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "subscription": "sub_123",
                "metadata": { "userId": user_id.to_string(), "tier": "pro" }
            }}
        })
        .to_string();
        let webhook = |signature: String| {
            Request::post("/api/stripe-webhook")
                .header("stripe-signature", signature)
                .body(Body::from(payload.clone()))
                .unwrap()
        };

        let response = app
            .clone()
            .oneshot(webhook(format!("t={},v1=deadbeef", Utc::now().timestamp())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.user(user_id).unwrap().subscription_tier, "free");

        let signature = WebhookVerifier::new(WEBHOOK_SECRET)
            .signature_header(payload.as_bytes(), Utc::now().timestamp());
        let response = app.oneshot(webhook(signature)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["received"], true);

        let user = store.user(user_id).unwrap();
        assert_eq!(user.subscription_tier, "pro");
        assert_eq!(user.subscription_status, "active");
        assert_eq!(user.subscription_id.as_deref(), Some("sub_123"));
    }
}
