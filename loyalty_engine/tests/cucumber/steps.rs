use cucumber::{then, when};
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatusType, Points},
    AccrualReport,
    AccrualSourceError,
    ExternalAccrualStatus,
    SubmitOrderResult,
    WithdrawalError,
};

use crate::cucumber::{loyalty_world::parse_points, LoyaltyWorld};

#[when(expr = "'{word}' submits order {word}")]
async fn submit_order(world: &mut LoyaltyWorld, login: String, number: String) {
    let user_id = world.user(&login);
    let result = world.orders().submit_order(user_id, &number).await.expect("Error submitting order");
    world.last_submission = Some(result);
}

#[when(expr = "the accrual service reports order {word} as {word}")]
async fn report_status(world: &mut LoyaltyWorld, number: String, status: String) {
    let status = parse_status(&status);
    world.accrual.set(&number, Ok(AccrualReport::new(status, None)));
}

#[when(expr = "the accrual service reports order {word} as PROCESSED with {word} points")]
async fn report_processed(world: &mut LoyaltyWorld, number: String, amount: String) {
    let report = AccrualReport::new(ExternalAccrualStatus::Processed, Some(parse_points(&amount)));
    world.accrual.set(&number, Ok(report));
}

#[when(expr = "the accrual service is down for order {word}")]
async fn accrual_down(world: &mut LoyaltyWorld, number: String) {
    world.accrual.set(&number, Err(AccrualSourceError::Unavailable("503 Service Unavailable".into())));
}

#[when("the reconciler runs")]
async fn reconcile(world: &mut LoyaltyWorld) {
    let summary = world.reconciler().reconcile_once(&world.accrual, None).await.expect("Error reconciling");
    world.last_pass = Some(summary);
}

#[when(expr = "'{word}' withdraws {word} points against order {word}")]
async fn withdraw(world: &mut LoyaltyWorld, login: String, amount: String, number: String) {
    let user_id = world.user(&login);
    let result = world.withdrawals().withdraw(user_id, &number, parse_points(&amount)).await.map(|_| ());
    world.last_withdrawal = Some(result);
}

#[then("the order is accepted")]
async fn order_accepted(world: &mut LoyaltyWorld) {
    let result = world.last_submission.as_ref().expect("No order was submitted");
    assert!(matches!(result, SubmitOrderResult::Accepted(_)), "Got {result:?}");
}

#[then("the order was already uploaded by this user")]
async fn order_already_owned(world: &mut LoyaltyWorld) {
    let result = world.last_submission.as_ref().expect("No order was submitted");
    assert!(matches!(result, SubmitOrderResult::AlreadyOwnedBySameUser(_)), "Got {result:?}");
}

#[then("the order belongs to someone else")]
async fn order_owned_by_other(world: &mut LoyaltyWorld) {
    let result = world.last_submission.as_ref().expect("No order was submitted");
    assert_eq!(result, &SubmitOrderResult::OwnedByOther);
}

#[then(expr = "order {word} has status {word}")]
async fn check_order_status(world: &mut LoyaltyWorld, number: String, status: String) {
    let order = world.accounts().order_by_number(&order_number(&number)).await.expect("Error fetching order");
    let order = order.unwrap_or_else(|| panic!("Order {number} does not exist"));
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    assert_eq!(order.status, expected);
}

#[then(expr = "order {word} has accrual {word}")]
async fn check_order_accrual(world: &mut LoyaltyWorld, number: String, amount: String) {
    let order = world.accounts().order_by_number(&order_number(&number)).await.expect("Error fetching order");
    let order = order.unwrap_or_else(|| panic!("Order {number} does not exist"));
    assert_eq!(order.accrual, Some(parse_points(&amount)));
}

#[then(expr = "'{word}' has {int} orders")]
async fn check_order_count(world: &mut LoyaltyWorld, login: String, count: usize) {
    let orders = world.accounts().orders_for_user(world.user(&login)).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count);
}

#[then(expr = "'{word}' has a balance of {word} with {word} withdrawn")]
async fn check_balance(world: &mut LoyaltyWorld, login: String, current: String, withdrawn: String) {
    let balance = world.accounts().balance_for_user(world.user(&login)).await.expect("Error fetching balance");
    assert_eq!(balance.current, parse_points(&current), "Current balance is incorrect");
    assert_eq!(balance.withdrawn, parse_points(&withdrawn), "Withdrawn total is incorrect");
}

#[then("the withdrawal succeeds")]
async fn withdrawal_succeeds(world: &mut LoyaltyWorld) {
    let result = world.last_withdrawal.as_ref().expect("No withdrawal was attempted");
    assert!(result.is_ok(), "Withdrawal failed: {result:?}");
}

#[then("the withdrawal is declined for lack of funds")]
async fn withdrawal_declined(world: &mut LoyaltyWorld) {
    let result = world.last_withdrawal.as_ref().expect("No withdrawal was attempted");
    assert!(matches!(result, Err(WithdrawalError::InsufficientBalance { .. })), "Got {result:?}");
}

#[then("the withdrawal is rejected as invalid")]
async fn withdrawal_invalid(world: &mut LoyaltyWorld) {
    let result = world.last_withdrawal.as_ref().expect("No withdrawal was attempted");
    assert!(
        matches!(result, Err(WithdrawalError::InvalidOrderNumber(_) | WithdrawalError::InvalidAmount(_))),
        "Got {result:?}"
    );
}

#[then(expr = "'{word}' has {int} withdrawals totalling {word}")]
async fn check_withdrawals(world: &mut LoyaltyWorld, login: String, count: usize, total: String) {
    let list = world.accounts().withdrawals_for_user(world.user(&login)).await.expect("Error fetching withdrawals");
    assert_eq!(list.len(), count);
    let sum = list.iter().map(|w| w.sum).sum::<Points>();
    assert_eq!(sum, parse_points(&total));
}

#[then(expr = "the last pass updated {int}, skipped {int} and failed {int}")]
async fn check_last_pass(world: &mut LoyaltyWorld, updated: usize, skipped: usize, failed: usize) {
    let summary = world.last_pass.expect("The reconciler has not run");
    assert_eq!((summary.updated, summary.skipped, summary.failed), (updated, skipped, failed), "{summary:?}");
}

fn parse_status(s: &str) -> ExternalAccrualStatus {
    match s {
        "REGISTERED" => ExternalAccrualStatus::Registered,
        "PROCESSING" => ExternalAccrualStatus::Processing,
        "INVALID" => ExternalAccrualStatus::Invalid,
        "PROCESSED" => ExternalAccrualStatus::Processed,
        _ => panic!("Unknown accrual status {s}"),
    }
}

fn order_number(s: &str) -> OrderNumber {
    s.parse().unwrap_or_else(|e| panic!("{e}"))
}
