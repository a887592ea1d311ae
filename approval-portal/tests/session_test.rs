mod common;

use approval_portal::models::{
    ApprovalLevel, ApprovalStatus, DocumentType, FieldState, LineItem, OptionOrigin,
};
use approval_portal::services::{Action, FieldChange};
use approval_portal::PortalError;
use rust_decimal::Decimal;

use common::{
    acknowledger, approver, checker, closer, draft, receiver, requester, OfflinePortal, DEPARTMENT,
};

#[tokio::test]
async fn requester_opens_draft_with_options_and_candidates() {
    let env = OfflinePortal::spawn();
    env.store.insert(draft("s-1")).unwrap();

    let session = env
        .portal
        .open(DocumentType::Reimbursement, "s-1", requester())
        .await
        .unwrap();

    assert_eq!(session.available_actions(), vec![Action::Submit]);
    let line = session.line(0).unwrap();
    let categories = line.categories().ready().unwrap();
    assert_eq!(categories.values(), vec!["Transport", "Lodging"]);
    assert_eq!(categories.selected(), Some("Transport"));
    let accounts = line.account_names().ready().unwrap();
    assert_eq!(accounts.selected(), Some("Taxi"));
    assert!(!line.is_account_historical());

    let candidates = session.approvers().expect("approvers resolved for the requester");
    assert_eq!(candidates.transaction_code(), "TR");
    assert_eq!(candidates.for_level(ApprovalLevel::Checked), &[checker()]);
    assert!(candidates.for_level(ApprovalLevel::Closed).is_empty());
}

#[tokio::test]
async fn other_viewers_get_a_read_only_session() {
    let env = OfflinePortal::spawn();
    env.store.insert(draft("s-2")).unwrap();

    let mut session = env
        .portal
        .open(DocumentType::Reimbursement, "s-2", checker())
        .await
        .unwrap();

    assert!(session.policy().is_read_only());
    assert!(session.approvers().is_none());
    assert!(session.available_actions().is_empty());
    assert!(matches!(
        session.set_line_amount(0, "10"),
        Err(PortalError::Forbidden(_))
    ));
    assert!(matches!(session.add_line(), Err(PortalError::Forbidden(_))));
    assert!(matches!(session.submit(), Err(PortalError::Forbidden(_))));
}

#[tokio::test]
async fn draft_opens_while_hierarchy_is_down() {
    let env = OfflinePortal::spawn();
    env.store.insert(draft("s-9")).unwrap();
    env.directory.set_failing(true);

    let mut session = env
        .portal
        .open(DocumentType::Reimbursement, "s-9", requester())
        .await
        .unwrap();

    assert!(session.approvers().is_none());
    let err = session.approvers_error().expect("hierarchy failure kept");
    assert!(err.is_retryable());
    assert!(session.line(0).unwrap().categories().ready().is_some());
    assert!(matches!(session.submit(), Err(PortalError::Validation(_))));

    env.directory.set_failing(false);
    session.refresh_approvers().await.unwrap();
    assert!(session.approvers_error().is_none());
    assert!(session.approvers().is_some());
}

#[tokio::test]
async fn category_change_cascades_to_account_names_and_gl_code() {
    let env = OfflinePortal::spawn();
    env.store.insert(draft("s-3")).unwrap();
    let mut session = env
        .portal
        .open(DocumentType::Reimbursement, "s-3", requester())
        .await
        .unwrap();

    let resolution = session
        .change_line(0, FieldChange::Category("Lodging".to_string()))
        .await
        .unwrap();
    assert!(!resolution.is_superseded());
    let line = session.line(0).unwrap();
    assert_eq!(line.item().gl_account_code, "");
    let accounts = line.account_names().ready().unwrap();
    assert!(accounts.values().contains(&"Hotel"));

    session
        .change_line(0, FieldChange::AccountName("Hotel".to_string()))
        .await
        .unwrap();
    let line = session.line(0).unwrap();
    assert_eq!(line.item().account_name, "Hotel");
    assert_eq!(line.item().gl_account_code, "6201");
    assert!(!line.is_account_historical());
    assert_eq!(session.document().line_items[0].gl_account_code, "6201");

    let err = session
        .change_line(0, FieldChange::AccountName("Minibar".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));
}

#[tokio::test]
async fn retired_account_name_is_shown_as_historical() {
    let env = OfflinePortal::spawn();
    let mut document = draft("s-4");
    document.line_items[0].account_name = "Car Rental".to_string();
    document.line_items[0].gl_account_code = "6199".to_string();
    env.store.insert(document).unwrap();

    let session = env
        .portal
        .open(DocumentType::Reimbursement, "s-4", requester())
        .await
        .unwrap();

    let line = session.line(0).unwrap();
    assert!(line.is_account_historical());
    let accounts = line.account_names().ready().unwrap();
    let option = accounts.selected_option().unwrap();
    assert_eq!(option.origin, OptionOrigin::Historical);
    assert_eq!(option.label(), "Car Rental (Historical)");
    assert_eq!(line.item().gl_account_code, "6199");
}

#[tokio::test]
async fn line_edits_keep_the_total_in_step() {
    let env = OfflinePortal::spawn();
    env.store.insert(draft("s-5")).unwrap();
    let mut session = env
        .portal
        .open(DocumentType::Reimbursement, "s-5", requester())
        .await
        .unwrap();

    let index = session.add_line().unwrap();
    assert_eq!(index, 1);
    let formatted = session.set_line_amount(index, "1,234.5").unwrap();
    assert_eq!(formatted.text, "1,234.50");
    session.set_tax_amounts("100", "34.5").unwrap();
    assert_eq!(session.total(), Decimal::new(151_300, 0));
    assert_eq!(session.formatted_total().text, "151,300.00");

    session.remove_line(0).unwrap();
    assert_eq!(session.lines().len(), 1);
    assert_eq!(session.line(0).unwrap().index(), 0);
    assert_eq!(session.total(), Decimal::new(1_300, 0));
    assert!(session.remove_line(3).is_err());
}

#[tokio::test]
async fn scope_change_disables_lines_until_complete() {
    let env = OfflinePortal::spawn();
    env.store.insert(draft("s-6")).unwrap();
    let mut session = env
        .portal
        .open(DocumentType::Reimbursement, "s-6", requester())
        .await
        .unwrap();

    session.set_scope(DEPARTMENT, "").await.unwrap();
    assert!(session.approvers().is_none());
    assert!(matches!(
        session.line(0).unwrap().categories(),
        FieldState::Disabled { .. }
    ));

    session.set_scope(DEPARTMENT, "Travelling").await.unwrap();
    assert!(session.approvers().is_some());
    assert!(session.line(0).unwrap().categories().ready().is_some());
}

#[tokio::test]
async fn submit_requires_every_route_level_assigned() {
    let env = OfflinePortal::spawn();
    env.store.insert(draft("s-7")).unwrap();
    let mut session = env
        .portal
        .open(DocumentType::Reimbursement, "s-7", requester())
        .await
        .unwrap();

    session.assign_approver(ApprovalLevel::Checked, &checker().id).unwrap();
    assert!(matches!(session.submit(), Err(PortalError::Validation(_))));

    assert!(matches!(
        session.assign_approver(ApprovalLevel::Acknowledged, "u-999"),
        Err(PortalError::Validation(_))
    ));
    session
        .assign_approver(ApprovalLevel::Acknowledged, &acknowledger().id)
        .unwrap();
    session.assign_approver(ApprovalLevel::Approved, &approver().id).unwrap();
    session.assign_approver(ApprovalLevel::Received, &receiver().id).unwrap();
    session.submit().unwrap();
    session.save().await.unwrap();

    let stored = env.store.get(DocumentType::Reimbursement, "s-7").unwrap();
    assert_eq!(stored.status(), ApprovalStatus::Prepared);
    assert_eq!(env.store.save_count(), 1);
    assert!(session.policy().is_read_only());
}

#[tokio::test]
async fn personal_loan_cash_advance_runs_through_closed() {
    let env = OfflinePortal::spawn();
    let mut session = env
        .portal
        .start_draft(DocumentType::CashAdvance, requester())
        .await
        .unwrap();
    let mut staged = session.document().clone();
    staged.staging_id = Some("ca-1".to_string());
    staged.document_number = "CA-0001".to_string();
    env.store.insert(staged).unwrap();

    session = env
        .portal
        .open(DocumentType::CashAdvance, "ca-1", requester())
        .await
        .unwrap();
    session.set_scope(DEPARTMENT, "Personal Loan").await.unwrap();
    session.set_currency("idr").unwrap();
    let index = session.add_line().unwrap();
    session
        .change_line(index, FieldChange::Category("Loan".to_string()))
        .await
        .unwrap();
    session
        .change_line(index, FieldChange::AccountName("Employee Loan".to_string()))
        .await
        .unwrap();
    session.set_line_amount(index, "5,000,000").unwrap();
    for (level, who) in [
        (ApprovalLevel::Checked, checker()),
        (ApprovalLevel::Acknowledged, acknowledger()),
        (ApprovalLevel::Approved, approver()),
        (ApprovalLevel::Received, receiver()),
        (ApprovalLevel::Closed, closer()),
    ] {
        session.assign_approver(level, &who.id).unwrap();
    }
    session.submit().unwrap();
    session.save().await.unwrap();

    for (level, who) in [
        (ApprovalLevel::Checked, checker()),
        (ApprovalLevel::Acknowledged, acknowledger()),
        (ApprovalLevel::Approved, approver()),
        (ApprovalLevel::Received, receiver()),
        (ApprovalLevel::Closed, closer()),
    ] {
        let mut reviewer = env
            .portal
            .open(DocumentType::CashAdvance, "ca-1", who.clone())
            .await
            .unwrap();
        assert!(reviewer.available_actions().contains(&Action::Advance(level)));
        reviewer.advance(level).unwrap();
        reviewer.save().await.unwrap();
    }

    let stored = env.store.get(DocumentType::CashAdvance, "ca-1").unwrap();
    assert_eq!(stored.status(), ApprovalStatus::Closed);
    assert!(stored.is_final());
    assert_eq!(stored.line_items, vec![{
        let mut line = LineItem::new("Loan", "Employee Loan", "1401");
        line.currency_code = "IDR".to_string();
        line.amount = Decimal::new(5_000_000, 0);
        line
    }]);
}

#[tokio::test]
async fn rejection_and_revision_are_recorded() {
    let env = OfflinePortal::spawn();
    let mut document = draft("s-8");
    for (level, who) in [
        (ApprovalLevel::Checked, checker()),
        (ApprovalLevel::Acknowledged, acknowledger()),
        (ApprovalLevel::Approved, approver()),
        (ApprovalLevel::Received, receiver()),
    ] {
        document.assign_approver(level, Some(who), &requester()).unwrap();
    }
    document.submit(&requester()).unwrap();
    env.store.insert(document).unwrap();

    let mut review = env
        .portal
        .open(DocumentType::Reimbursement, "s-8", checker())
        .await
        .unwrap();
    review
        .request_revision(ApprovalLevel::Checked, "Attach the receipt")
        .unwrap();
    review.save().await.unwrap();

    let mut fix = env
        .portal
        .open(DocumentType::Reimbursement, "s-8", requester())
        .await
        .unwrap();
    assert_eq!(fix.document().status(), ApprovalStatus::Revision);
    assert_eq!(fix.document().revisions().len(), 1);
    assert!(fix.approvers().is_some());
    fix.set_line_description(0, "Airport taxi").unwrap();
    fix.submit().unwrap();
    fix.save().await.unwrap();

    let mut review = env
        .portal
        .open(DocumentType::Reimbursement, "s-8", checker())
        .await
        .unwrap();
    assert!(matches!(review.reject("  "), Err(PortalError::Validation(_))));
    review.reject("Duplicate claim").unwrap();
    let closed = review.close();
    assert_eq!(closed.status(), ApprovalStatus::Rejected);
    let rejection = closed.approval().rejection().unwrap();
    assert_eq!(rejection.remarks(), "Duplicate claim");
    assert_eq!(
        rejection.snapshot().map(|s| s.total),
        Some(Decimal::new(150_000, 0))
    );
}
