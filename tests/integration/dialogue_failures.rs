use super::support::ChatFixture;
use phonestar::chat::{messages, LastIntent};
use phonestar::events::EventKind;
use phonestar::models::{AnalysisResult, AskKind, AskResponse};
use phonestar::services::BackendError;
use std::time::{Duration, Instant};

#[tokio::test]
async fn rejected_analysis_keeps_the_number_in_context() {
    let fixture = ChatFixture::new();
    fixture
        .backend
        .push_analysis(Ok(AnalysisResult::failed("0931328218", "Hết lượt phân tích")));

    let reply = fixture.say("0931328218").await;

    assert_eq!(reply.content, messages::GENERIC_FAILURE);
    assert!(!reply.has_analysis());
    let context = fixture.context();
    assert_eq!(context.last_intent, LastIntent::Phone);
    assert_eq!(context.last_phone_number.as_deref(), Some("0931328218"));
}

#[tokio::test]
async fn network_failure_becomes_generic_reply() {
    let fixture = ChatFixture::new();
    fixture
        .backend
        .push_analysis(Err(BackendError::Network("connection reset".into())));

    let reply = fixture.say("0931328218").await;

    assert_eq!(reply.content, messages::GENERIC_FAILURE);
    assert!(!reply.content.contains("connection reset"));
    assert_eq!(fixture.log.count(EventKind::TurnEnded), 1);
    assert!(!fixture.engine.is_busy());
}

#[tokio::test]
async fn failed_follow_up_is_retried_as_general() {
    let fixture = ChatFixture::new();
    fixture.say("0931328218").await;
    fixture.backend.push_answer(Err(BackendError::Status {
        code: 502,
        message: "bad gateway".into(),
    }));
    fixture
        .backend
        .push_answer(Ok(AskResponse::answered("Câu trả lời chung.")));

    let reply = fixture.say("vậy còn tình duyên?").await;

    assert_eq!(reply.content, "Câu trả lời chung.");
    let asks = fixture.backend.asks();
    assert_eq!(asks.len(), 2);
    assert_eq!(asks[0].kind, AskKind::Followup);
    assert_eq!(asks[1].kind, AskKind::General);
    assert_eq!(asks[1].question, "vậy còn tình duyên?");
    assert_eq!(fixture.context().last_intent, LastIntent::FollowUp);
}

#[tokio::test]
async fn failed_follow_up_and_fallback_give_generic_reply() {
    let fixture = ChatFixture::new();
    fixture.say("0931328218").await;
    fixture
        .backend
        .push_answer(Err(BackendError::Network("offline".into())));
    fixture
        .backend
        .push_answer(Err(BackendError::Network("still offline".into())));

    let reply = fixture.say("giải thích thêm").await;

    assert_eq!(reply.content, messages::GENERIC_FAILURE);
    assert_eq!(fixture.backend.asks().len(), 2);
}

#[tokio::test]
async fn unsuccessful_ask_reply_is_a_failure() {
    let fixture = ChatFixture::new();
    fixture.backend.push_answer(Ok(AskResponse {
        success: false,
        answer: Some("ignored".into()),
        message: Some("Token expired".into()),
    }));

    let reply = fixture.say("ý nghĩa bát tinh").await;

    assert_eq!(reply.content, messages::GENERIC_FAILURE);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let fixture =
        ChatFixture::build(|engine| engine.with_request_timeout(Duration::from_millis(50)));
    fixture.backend.delay_replies(Duration::from_secs(5));

    let started = Instant::now();
    let reply = fixture.say("bát tinh là gì").await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(reply.content, messages::GENERIC_FAILURE);
    assert_eq!(fixture.log.count(EventKind::TurnEnded), 1);
    assert!(!fixture.engine.is_busy());
}
