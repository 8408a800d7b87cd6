mod utils;

use std::time::Duration;

use async_trait::async_trait;
use dex_intent::{
    currency::{Address, Currency},
    session::AllowanceQuery,
    ApprovalState, Error, ExecutionError, ExecutionRequest, InputError, ProviderError, Settings,
    SubmitBlock, SwapAction, SwapField, TradeType, TransactionSubmitter, TxHash, Uint256,
};
use utils::test_utils::{
    account, amount, eth, quote, session_with, swap_trade, test_settings, usdc, weth,
    FakeSubmitter,
};

/// Signer whose transactions never come back
struct StalledSubmitter;

#[async_trait]
impl TransactionSubmitter for StalledSubmitter {
    async fn approve(
        &self,
        _token: &Currency,
        _spender: Address,
        _amount: Uint256,
    ) -> Result<TxHash, ProviderError> {
        std::future::pending().await
    }

    async fn execute(&self, _request: &ExecutionRequest) -> Result<TxHash, ProviderError> {
        std::future::pending().await
    }
}

fn allowance_query(session: &dex_intent::SwapSession) -> AllowanceQuery {
    AllowanceQuery {
        owner: account(),
        approval: session
            .approval()
            .key()
            .cloned()
            .expect("trade requires an approval"),
    }
}

#[test]
fn test_empty_independent_field_is_no_amount() {
    let mut session = session_with(test_settings(), usdc(), weth(), "");
    session.apply_balance(account(), amount(usdc(), 0));

    let info = session.derived().clone();
    assert_eq!(info.parsed_amounts.input, None, "nothing entered on input");
    assert_eq!(info.parsed_amounts.output, None, "nothing computed on output");
    assert_eq!(info.input_error, Some(InputError::NoAmount));
    assert!(!session.can_submit());

    println!("  ✓ Empty input reports NoAmount, never InsufficientBalance");
}

#[tokio::test]
async fn test_approval_gates_submit_until_allowance_read() {
    let mut session = session_with(test_settings(), usdc(), weth(), "10");
    session.apply_balance(account(), amount(usdc(), 1_000_000_000));
    quote(
        &mut session,
        swap_trade(
            TradeType::ExactInput,
            amount(usdc(), 10_000_000),
            amount(weth(), 5_000_000_000_000_000),
            10,
        ),
    );

    let query = allowance_query(&session);
    assert_eq!(query.approval.required, Uint256::from(10_000_000u128));
    assert_eq!(
        session.apply_allowance(&query, Uint256::zero()),
        ApprovalState::NotApproved
    );

    assert_eq!(session.derived().input_error, None, "inputs are valid");
    assert_eq!(
        session.submit_gate(),
        Err(SubmitBlock::ApprovalRequired {
            symbol: "USDC".to_string()
        })
    );

    let submitter = FakeSubmitter::succeeding();
    let tx = session.approve(&submitter).await.expect("approval submitted");
    assert_eq!(tx.as_str(), "0xapprove");
    assert_eq!(session.approval_state(), ApprovalState::Pending);
    assert_eq!(
        submitter.approvals.lock().unwrap()[0].2,
        Uint256::MAX,
        "unlimited approval by default"
    );
    assert!(!session.can_submit(), "pending approval still blocks");

    // lagging read keeps it pending
    session.apply_allowance(&query, Uint256::zero());
    assert_eq!(session.approval_state(), ApprovalState::Pending);

    session.apply_allowance(&query, Uint256::from(10_000_000u128));
    assert_eq!(session.approval_state(), ApprovalState::Approved);
    assert!(session.can_submit());

    println!("  ✓ Approval handshake unblocks submit only after the allowance read");
}

#[tokio::test]
async fn test_exact_approval_amount() {
    let settings = Settings {
        approve_exact: true,
        ..test_settings()
    };
    let mut session = session_with(settings, usdc(), weth(), "10");
    quote(
        &mut session,
        swap_trade(
            TradeType::ExactInput,
            amount(usdc(), 10_000_000),
            amount(weth(), 1),
            10,
        ),
    );
    let query = allowance_query(&session);
    session.apply_allowance(&query, Uint256::zero());

    let submitter = FakeSubmitter::succeeding();
    session.approve(&submitter).await.expect("approval submitted");
    assert_eq!(
        submitter.approvals.lock().unwrap()[0].2,
        Uint256::from(10_000_000u128)
    );

    session.approval_failed().expect("pending approval can fail");
    assert_eq!(session.approval_state(), ApprovalState::NotApproved);
}

#[tokio::test]
async fn test_stale_trade_blocks_send_until_accepted() {
    let mut session = session_with(test_settings(), usdc(), weth(), "100");
    session.apply_balance(account(), amount(usdc(), 1_000_000_000));
    quote(
        &mut session,
        swap_trade(
            TradeType::ExactInput,
            amount(usdc(), 100_000_000),
            amount(weth(), 95_000),
            10,
        ),
    );
    let query = allowance_query(&session);
    session.apply_allowance(&query, Uint256::MAX);

    let confirmed = session.begin_confirmation().expect("confirmation opens");
    assert_eq!(confirmed.output_amount(), &amount(weth(), 95_000));

    // refreshed quote for the same request moved
    quote(
        &mut session,
        swap_trade(
            TradeType::ExactInput,
            amount(usdc(), 100_000_000),
            amount(weth(), 90_000),
            10,
        ),
    );
    assert!(session.needs_acceptance());

    let submitter = FakeSubmitter::succeeding();
    let blocked = session.execute(&submitter).await;
    assert!(
        matches!(blocked, Err(Error::Blocked(SubmitBlock::StaleTrade))),
        "send must be blocked, got {:?}",
        blocked
    );
    assert!(submitter.executed.lock().unwrap().is_empty());

    session.accept_updated_trade().expect("accept latest trade");
    let record = session.execute(&submitter).await.expect("swap sent");

    // 90_000 * 0.995
    assert_eq!(record.request.minimum_amount_out, amount(weth(), 89_550));
    assert_eq!(record.request.trade.output_amount(), &amount(weth(), 90_000));
    assert_eq!(record.request.recipient, account());
    assert!(record.summary.contains("USDC"));

    assert_eq!(session.form().typed_value(), "", "form resets on success");
    assert!(session.confirmation().is_none());

    println!("  ✓ Stale quote required re-acceptance and new bounds were used");
}

#[tokio::test]
async fn test_rejected_swap_keeps_form() {
    let mut session = session_with(test_settings(), eth(), usdc(), "1");
    session.apply_balance(account(), amount(eth(), 2_000_000_000_000_000_000));
    quote(
        &mut session,
        swap_trade(
            TradeType::ExactInput,
            amount(eth(), 1_000_000_000_000_000_000),
            amount(usdc(), 3_000_000_000),
            10,
        ),
    );
    // native input never needs an allowance
    assert_eq!(session.approval_state(), ApprovalState::Approved);
    session.begin_confirmation().expect("confirmation opens");

    let submitter = FakeSubmitter::failing_execute(dex_intent::ProviderError::with_code(
        4001,
        "User rejected the request.",
    ));
    let result = session.execute(&submitter).await;
    assert!(matches!(
        result,
        Err(Error::Execution(ExecutionError::UserRejected))
    ));
    assert_eq!(session.form().typed_value(), "1", "form kept for retry");
    assert!(session.confirmation().is_some());
    assert!(session.can_submit(), "user can retry right away");
}

#[test]
fn test_price_impact_requires_override() {
    let high_impact = |settings: Settings, impact_bips: u32| {
        let mut session = session_with(settings, eth(), usdc(), "1");
        quote(
            &mut session,
            swap_trade(
                TradeType::ExactInput,
                amount(eth(), 1_000_000_000_000_000_000),
                amount(usdc(), 3_000_000_000),
                impact_bips,
            ),
        );
        session
    };

    let mut mild = high_impact(test_settings(), 50);
    assert!(mild.can_submit(), "0.5% needs no override");

    let mut seven = high_impact(test_settings(), 700);
    assert_eq!(seven.submit_gate(), Err(SubmitBlock::PriceImpactUnacknowledged));
    seven.acknowledge_price_impact();
    assert!(seven.can_submit());

    // editing the form clears the acknowledgement
    seven.dispatch(SwapAction::TypeInput {
        field: SwapField::Input,
        value: "1.0".to_string(),
    });
    assert!(!seven.can_submit());

    let mut severe = high_impact(test_settings(), 1_500);
    severe.acknowledge_price_impact();
    assert_eq!(severe.submit_gate(), Err(SubmitBlock::PriceImpactTooHigh));

    let expert = Settings {
        expert_mode: true,
        ..test_settings()
    };
    let mut severe_expert = high_impact(expert, 1_500);
    assert!(severe_expert.can_submit());

    println!("  ✓ High impact needs acknowledgement, severe needs expert mode");
}

#[test]
fn test_exact_output_direction() {
    let mut session = session_with(test_settings(), usdc(), weth(), "");
    session.dispatch(SwapAction::TypeInput {
        field: SwapField::Output,
        value: "0.5".to_string(),
    });
    let request = session.quote_request().cloned().expect("quote requested");
    assert_eq!(request.trade_type, TradeType::ExactOutput);
    assert_eq!(request.amount, amount(weth(), 500_000_000_000_000_000));

    quote(
        &mut session,
        swap_trade(
            TradeType::ExactOutput,
            amount(usdc(), 1_000_000_000),
            amount(weth(), 500_000_000_000_000_000),
            10,
        ),
    );
    session.apply_balance(account(), amount(usdc(), 1_004_000_000));

    let info = session.derived().clone();
    let bounds = info.slippage_adjusted.expect("bounds for a trade");
    assert_eq!(bounds.maximum_amount_in, amount(usdc(), 1_005_000_000));
    assert_eq!(
        info.input_error,
        Some(InputError::InsufficientBalance {
            symbol: "USDC".to_string()
        }),
        "maximum input exceeds balance"
    );
}

#[tokio::test]
async fn test_unconfigured_spender_blocks_token_swap() {
    let mut session = session_with(Settings::default(), usdc(), weth(), "10");
    session.apply_balance(account(), amount(usdc(), 1_000_000_000));
    quote(
        &mut session,
        swap_trade(
            TradeType::ExactInput,
            amount(usdc(), 10_000_000),
            amount(weth(), 5_000_000_000_000_000),
            10,
        ),
    );

    assert_eq!(session.approval_state(), ApprovalState::Unknown);
    assert_eq!(
        session.submit_gate(),
        Err(SubmitBlock::MissingSpender {
            symbol: "USDC".to_string()
        })
    );
    assert!(session.begin_confirmation().is_err());
    assert!(session.approve(&FakeSubmitter::succeeding()).await.is_err());

    // native input needs no spender
    let mut native = session_with(Settings::default(), eth(), usdc(), "1");
    quote(
        &mut native,
        swap_trade(
            TradeType::ExactInput,
            amount(eth(), 1_000_000_000_000_000_000),
            amount(usdc(), 3_000_000_000),
            10,
        ),
    );
    assert!(native.can_submit());

    println!("  ✓ Token swap without a known spender cannot be submitted");
}

#[tokio::test]
async fn test_abandoned_send_does_not_lock_session() {
    let mut session = session_with(test_settings(), eth(), usdc(), "1");
    quote(
        &mut session,
        swap_trade(
            TradeType::ExactInput,
            amount(eth(), 1_000_000_000_000_000_000),
            amount(usdc(), 3_000_000_000),
            10,
        ),
    );
    session.begin_confirmation().expect("confirmation opens");

    let attempt = tokio::time::timeout(
        Duration::from_millis(20),
        session.execute(&StalledSubmitter),
    )
    .await;
    assert!(attempt.is_err(), "send never completes");

    assert_eq!(session.submit_gate(), Ok(()));
    let record = session
        .execute(&FakeSubmitter::succeeding())
        .await
        .expect("retry goes through");
    assert_eq!(record.tx.as_str(), "0xswap");
    let ttl = test_settings().deadline_secs as i64;
    let now = chrono::Utc::now().timestamp();
    assert!(record.request.deadline > now + ttl - 60 && record.request.deadline <= now + ttl);
}
