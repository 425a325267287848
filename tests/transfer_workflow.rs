//! Transfer authorization integration tests

use chrono::Duration;
use retail_ledger::domain::{Notification, TransactionStatus, TransactionType};
use retail_ledger::ledger::TransferCommand;
use retail_ledger::users::SecurityQuestion;
use retail_ledger::workflow::{TransferState, WorkflowConfig};
use retail_ledger::{ErrorKind, TransactionFilter, TransactionQuery};
use rust_decimal_macros::dec;

mod common;

use common::{transfer_fixture, SECURITY_ANSWER};

#[tokio::test]
async fn test_authorized_transfer_e2e() {
    let f = transfer_fixture(WorkflowConfig::default(), dec!(1000)).await;

    // 1. Initiate
    let challenge = f
        .workflow
        .initiate(
            f.user_id,
            TransferCommand::new(&f.sender, &f.receiver, dec!(200), "rent"),
        )
        .await
        .unwrap();
    assert_eq!(challenge.question, SecurityQuestion::PetName);
    assert_eq!(
        f.workflow.state(f.user_id).await,
        Some(TransferState::SecurityQuestionPending)
    );

    // 2. A wrong answer keeps the session and moves nothing
    let err = f
        .workflow
        .answer_security_question(f.user_id, "rex")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongAnswer);
    assert_eq!(
        f.ledger.account(&f.sender).await.unwrap().balance().value(),
        dec!(1000)
    );

    // 3. Answer the security question
    f.workflow
        .answer_security_question(f.user_id, SECURITY_ANSWER)
        .await
        .unwrap();
    assert_eq!(f.workflow.state(f.user_id).await, Some(TransferState::OtpPending));
    let otp = f.notifier.last_otp(f.user_id).await.unwrap();
    assert_eq!(otp.len(), 6);

    // Nothing moves before the passcode
    assert_eq!(
        f.ledger.account(&f.sender).await.unwrap().balance().value(),
        dec!(1000)
    );

    // 4. Submit the passcode
    let tx = f.workflow.submit_otp(f.user_id, &otp).await.unwrap();
    assert_eq!(tx.transaction_type(), TransactionType::Transfer);
    assert_eq!(tx.status(), TransactionStatus::Completed);
    assert_eq!(tx.amount(), dec!(200));
    assert_eq!(tx.description(), "rent");

    assert_eq!(
        f.ledger.account(&f.sender).await.unwrap().balance().value(),
        dec!(800)
    );
    assert_eq!(
        f.ledger.account(&f.receiver).await.unwrap().balance().value(),
        dec!(200)
    );
    assert_eq!(f.workflow.state(f.user_id).await, None);

    // The sender sees the transfer in their history
    let history = TransactionQuery::new(f.ledger.store().clone())
        .list(
            f.user_id,
            &TransactionFilter::default().of_type(TransactionType::Transfer),
        )
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id(), tx.id());

    let sent = f.notifier.sent().await;
    assert!(sent.iter().any(|n| matches!(
        n,
        Notification::TransferCompleted { amount, .. } if *amount == dec!(200)
    )));
}

#[tokio::test]
async fn test_otp_cannot_be_reused() {
    let f = transfer_fixture(WorkflowConfig::default(), dec!(1000)).await;

    f.workflow
        .initiate(
            f.user_id,
            TransferCommand::new(&f.sender, &f.receiver, dec!(100), "gift"),
        )
        .await
        .unwrap();
    f.workflow
        .answer_security_question(f.user_id, SECURITY_ANSWER)
        .await
        .unwrap();
    let otp = f.notifier.last_otp(f.user_id).await.unwrap();

    f.workflow.submit_otp(f.user_id, &otp).await.unwrap();
    let replay = f.workflow.submit_otp(f.user_id, &otp).await.unwrap_err();
    assert_eq!(replay.kind(), ErrorKind::SessionNotFound);

    assert_eq!(
        f.ledger.account(&f.sender).await.unwrap().balance().value(),
        dec!(900)
    );
}

#[tokio::test]
async fn test_expired_otp_is_rejected() {
    let config = WorkflowConfig {
        otp_ttl: Duration::zero(),
        ..WorkflowConfig::default()
    };
    let f = transfer_fixture(config, dec!(1000)).await;

    f.workflow
        .initiate(
            f.user_id,
            TransferCommand::new(&f.sender, &f.receiver, dec!(100), "gift"),
        )
        .await
        .unwrap();
    f.workflow
        .answer_security_question(f.user_id, SECURITY_ANSWER)
        .await
        .unwrap();
    let otp = f.notifier.last_otp(f.user_id).await.unwrap();

    let err = f.workflow.submit_otp(f.user_id, &otp).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOrExpiredOtp);
    assert_eq!(f.workflow.state(f.user_id).await, None);
    assert_eq!(
        f.ledger.account(&f.sender).await.unwrap().balance().value(),
        dec!(1000)
    );
}

#[tokio::test]
async fn test_wrong_otp_then_right_one() {
    let f = transfer_fixture(WorkflowConfig::default(), dec!(1000)).await;

    f.workflow
        .initiate(
            f.user_id,
            TransferCommand::new(&f.sender, &f.receiver, dec!(50), "dinner"),
        )
        .await
        .unwrap();
    f.workflow
        .answer_security_question(f.user_id, SECURITY_ANSWER)
        .await
        .unwrap();
    let otp = f.notifier.last_otp(f.user_id).await.unwrap();
    // Seven digits never match a six-digit code
    let wrong = format!("{}0", otp);

    let err = f.workflow.submit_otp(f.user_id, &wrong).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOrExpiredOtp);
    assert_eq!(f.workflow.state(f.user_id).await, Some(TransferState::OtpPending));

    f.workflow.submit_otp(f.user_id, &otp).await.unwrap();
    assert_eq!(
        f.ledger.account(&f.receiver).await.unwrap().balance().value(),
        dec!(50)
    );
}

#[tokio::test]
async fn test_too_many_wrong_otps_rejects_transfer() {
    let f = transfer_fixture(WorkflowConfig::default(), dec!(1000)).await;

    f.workflow
        .initiate(
            f.user_id,
            TransferCommand::new(&f.sender, &f.receiver, dec!(50), "dinner"),
        )
        .await
        .unwrap();
    f.workflow
        .answer_security_question(f.user_id, SECURITY_ANSWER)
        .await
        .unwrap();
    let otp = f.notifier.last_otp(f.user_id).await.unwrap();
    let wrong = format!("{}0", otp);

    for _ in 0..2 {
        let err = f.workflow.submit_otp(f.user_id, &wrong).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOrExpiredOtp);
    }
    let err = f.workflow.submit_otp(f.user_id, &wrong).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rejected);

    // The session is gone, so even the right code no longer works
    let err = f.workflow.submit_otp(f.user_id, &otp).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SessionNotFound);
}

#[tokio::test]
async fn test_insufficient_funds_surfaces_at_commit() {
    let f = transfer_fixture(WorkflowConfig::default(), dec!(100)).await;

    f.workflow
        .initiate(
            f.user_id,
            TransferCommand::new(&f.sender, &f.receiver, dec!(150), "too much"),
        )
        .await
        .unwrap();
    f.workflow
        .answer_security_question(f.user_id, SECURITY_ANSWER)
        .await
        .unwrap();
    let otp = f.notifier.last_otp(f.user_id).await.unwrap();

    let err = f.workflow.submit_otp(f.user_id, &otp).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    assert_eq!(
        f.ledger.account(&f.sender).await.unwrap().balance().value(),
        dec!(100)
    );
}
