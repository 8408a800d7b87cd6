use async_trait::async_trait;
use dex_intent::{
    currency::{Address, Currency},
    trade::{Route, RouteHop, SwapTrade},
    Amount, ChainReader, ContractAddresses, ExecutionRequest, Percent, ProviderError,
    QuoteOutcome, QuoteRequest, Settings, SwapAction, SwapField, SwapSession, Trade, TradeQuoter,
    TradeType, TransactionSubmitter, TxHash, Uint256,
};
use std::collections::HashMap;
use std::sync::Mutex;

#[cfg(test)]
#[allow(dead_code)]
pub mod test_utils {
    use super::*;

    pub const ACCOUNT: &str = "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984";
    pub const ROUTER: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";
    pub const POOL: &str = "0xb4e16d0168e52d35cacd2c6185b44281ec28c9dc";

    pub fn account() -> Address {
        ACCOUNT.parse().expect("valid account address")
    }

    pub fn router() -> Address {
        ROUTER.parse().expect("valid router address")
    }

    pub fn weth() -> Currency {
        Currency::token(
            1,
            "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".parse().unwrap(),
            18,
            "WETH",
        )
    }

    pub fn usdc() -> Currency {
        Currency::token(
            1,
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".parse().unwrap(),
            6,
            "USDC",
        )
    }

    pub fn eth() -> Currency {
        Currency::native(1, 18, "ETH")
    }

    pub fn amount(currency: Currency, raw: u128) -> Amount {
        Amount::from_raw(currency, Uint256::from(raw))
    }

    /// Default settings with the router configured as swap spender
    pub fn test_settings() -> Settings {
        Settings {
            contracts: ContractAddresses {
                router: Some(router()),
                ..ContractAddresses::default()
            },
            ..Settings::default()
        }
    }

    pub fn swap_trade(
        trade_type: TradeType,
        input: Amount,
        output: Amount,
        impact_bips: u32,
    ) -> Trade {
        let route = Route::new(
            vec![input.currency().clone(), output.currency().clone()],
            vec![RouteHop {
                pool: POOL.parse().unwrap(),
                fee_bips: 30,
            }],
        )
        .expect("valid route");
        Trade::Swap(SwapTrade {
            trade_type,
            route,
            input_amount: input,
            output_amount: output,
            price_impact: Percent::from_bips(impact_bips),
        })
    }

    /// Connected session with `input -> output` selected and `typed`
    /// entered into the input field
    pub fn session_with(settings: Settings, input: Currency, output: Currency, typed: &str) -> SwapSession {
        let mut session = SwapSession::new(settings);
        session.connect(Some(account()));
        session.dispatch(SwapAction::SelectCurrency {
            field: SwapField::Input,
            currency: input,
        });
        session.dispatch(SwapAction::SelectCurrency {
            field: SwapField::Output,
            currency: output,
        });
        session.dispatch(SwapAction::TypeInput {
            field: SwapField::Input,
            value: typed.to_string(),
        });
        session
    }

    /// Apply `trade` as the answer to the session's current quote request
    pub fn quote(session: &mut SwapSession, trade: Trade) {
        let request = session
            .quote_request()
            .cloned()
            .expect("session has a quote request");
        assert!(
            session.apply_quote(&request, QuoteOutcome::Trade(trade)),
            "quote should match the current request"
        );
    }

    /// Quoter returning whatever outcome is currently configured
    pub struct FakeQuoter {
        pub outcome: Mutex<QuoteOutcome>,
        pub calls: Mutex<Vec<QuoteRequest>>,
    }

    impl FakeQuoter {
        pub fn new(outcome: QuoteOutcome) -> Self {
            Self {
                outcome: Mutex::new(outcome),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TradeQuoter for FakeQuoter {
        async fn quote(&self, request: &QuoteRequest) -> Result<QuoteOutcome, ProviderError> {
            self.calls.lock().unwrap().push(request.clone());
            Ok(self.outcome.lock().unwrap().clone())
        }
    }

    /// In-memory balances and allowances
    #[derive(Default)]
    pub struct FakeChain {
        pub balances: Mutex<HashMap<Currency, Amount>>,
        pub allowances: Mutex<HashMap<(Currency, Address), Uint256>>,
    }

    #[async_trait]
    impl ChainReader for FakeChain {
        async fn balance_of(&self, _account: Address, currency: &Currency) -> Result<Amount, ProviderError> {
            Ok(self
                .balances
                .lock()
                .unwrap()
                .get(currency)
                .cloned()
                .unwrap_or_else(|| Amount::zero(currency.clone())))
        }

        async fn allowance(
            &self,
            _owner: Address,
            token: &Currency,
            spender: Address,
        ) -> Result<Uint256, ProviderError> {
            Ok(self
                .allowances
                .lock()
                .unwrap()
                .get(&(token.clone(), spender))
                .copied()
                .unwrap_or_default())
        }
    }

    /// Signer that records requests and answers with configured results
    pub struct FakeSubmitter {
        pub approve_result: Mutex<Result<TxHash, ProviderError>>,
        pub execute_result: Mutex<Result<TxHash, ProviderError>>,
        pub approvals: Mutex<Vec<(Currency, Address, Uint256)>>,
        pub executed: Mutex<Vec<ExecutionRequest>>,
    }

    impl FakeSubmitter {
        pub fn succeeding() -> Self {
            Self {
                approve_result: Mutex::new(Ok(TxHash::new("0xapprove"))),
                execute_result: Mutex::new(Ok(TxHash::new("0xswap"))),
                approvals: Mutex::new(Vec::new()),
                executed: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_execute(error: ProviderError) -> Self {
            let submitter = Self::succeeding();
            *submitter.execute_result.lock().unwrap() = Err(error);
            submitter
        }
    }

    #[async_trait]
    impl TransactionSubmitter for FakeSubmitter {
        async fn approve(
            &self,
            token: &Currency,
            spender: Address,
            amount: Uint256,
        ) -> Result<TxHash, ProviderError> {
            self.approvals
                .lock()
                .unwrap()
                .push((token.clone(), spender, amount));
            self.approve_result.lock().unwrap().clone()
        }

        async fn execute(&self, request: &ExecutionRequest) -> Result<TxHash, ProviderError> {
            self.executed.lock().unwrap().push(request.clone());
            self.execute_result.lock().unwrap().clone()
        }
    }
}
