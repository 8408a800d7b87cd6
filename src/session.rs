//! Swap form session
//!
//! One [`SwapSession`] per open swap form. It owns the form, the latest
//! facts read from outside (quote, balances, allowance) and the approval
//! and confirmation state machines. Every write goes through `&mut self`,
//! so there is exactly one writer.
//!
//! Asynchronous results are applied with the parameters they were fetched
//! for; a result whose parameters no longer match is discarded.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use cosmwasm_std::Uint256;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::amount::{Amount, Percent};
use crate::approval::{amount_to_approve, ApprovalKey, ApprovalState, ApprovalTracker};
use crate::config::Settings;
use crate::currency::{Address, Currency};
use crate::error::{Error, ExecutionError, InputError, ProviderError, SubmitBlock};
use crate::field::SwapField;
use crate::memo::Memo;
use crate::price_impact::{price_breakdown, PriceBreakdown};
use crate::provider::{ChainReader, ExecutionRequest, TradeQuoter, TransactionSubmitter, TxHash};
use crate::staleness::Confirmation;
use crate::subscription::{spawn_poll, Keyed, PollLease};
use crate::swap::{
    derive_swap_info, max_amount_spend, DerivedSwapInfo, SwapAction, SwapFormState, SwapPair,
};
use crate::trade::{QuoteOutcome, QuoteRequest, QuoteState, Trade, TradeType};

/// Allowance read parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowanceQuery {
    pub owner: Address,
    pub approval: ApprovalKey,
}

/// Balance read parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceQuery {
    pub account: Address,
    pub currencies: Vec<Currency>,
}

/// Outcome of a successful swap submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub tx: TxHash,
    pub summary: String,
    pub request: ExecutionRequest,
}

type DeriveKey = (
    SwapFormState,
    Option<Address>,
    SwapPair<Option<Amount>>,
    QuoteState,
    Percent,
);

pub struct SwapSession {
    settings: Settings,
    account: Option<Address>,
    form: SwapFormState,
    quote_request: Option<QuoteRequest>,
    quote: QuoteState,
    balances: HashMap<(Address, Currency), Amount>,
    approval: ApprovalTracker,
    confirmation: Option<Confirmation>,
    price_impact_acknowledged: bool,
    memo: Memo<DeriveKey, DerivedSwapInfo>,
    quote_params: watch::Sender<Option<QuoteRequest>>,
    allowance_params: watch::Sender<Option<AllowanceQuery>>,
    balance_params: watch::Sender<Option<BalanceQuery>>,
}

impl SwapSession {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            account: None,
            form: SwapFormState::new(),
            quote_request: None,
            quote: QuoteState::Idle,
            balances: HashMap::new(),
            approval: ApprovalTracker::new(),
            confirmation: None,
            price_impact_acknowledged: false,
            memo: Memo::new(),
            quote_params: watch::channel(None).0,
            allowance_params: watch::channel(None).0,
            balance_params: watch::channel(None).0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn form(&self) -> &SwapFormState {
        &self.form
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn quote_state(&self) -> &QuoteState {
        &self.quote
    }

    pub fn quote_request(&self) -> Option<&QuoteRequest> {
        self.quote_request.as_ref()
    }

    pub fn approval_state(&self) -> ApprovalState {
        self.approval.state()
    }

    pub fn approval(&self) -> &ApprovalTracker {
        &self.approval
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    /// Number of derivations actually computed so far
    pub fn derivations(&self) -> u64 {
        self.memo.computations()
    }

    pub fn connect(&mut self, account: Option<Address>) {
        if self.account == account {
            return;
        }
        info!(?account, "Account changed");
        self.account = account;
        self.refresh();
    }

    pub fn dispatch(&mut self, action: SwapAction) {
        let next = self.form.reduce(&action);
        if next == self.form {
            return;
        }
        debug!(?action, "Form updated");
        self.form = next;
        self.price_impact_acknowledged = false;
        self.refresh();
    }

    /// Quote parameters implied by the form, if it can be quoted
    fn wanted_quote(&self) -> Option<QuoteRequest> {
        let input_currency = self.form.input_currency.clone()?;
        let output_currency = self.form.output_currency.clone()?;
        let field = self.form.independent_field();
        let currency = self.form.currency(field)?;
        let amount = crate::codec::parse(self.form.typed_value(), currency)
            .ok()
            .flatten()
            .filter(|a| !a.is_zero())?;
        let trade_type = match field {
            SwapField::Input => TradeType::ExactInput,
            SwapField::Output => TradeType::ExactOutput,
        };
        Some(QuoteRequest {
            input_currency,
            output_currency,
            amount,
            trade_type,
        })
    }

    /// Recompute every outgoing request from the current inputs
    fn refresh(&mut self) {
        let wanted = self.wanted_quote();
        if wanted != self.quote_request {
            self.quote = if wanted.is_some() {
                QuoteState::Loading
            } else {
                QuoteState::Idle
            };
            self.quote_request = wanted.clone();
            self.quote_params.send_replace(wanted);
        }

        let balance_query = self.account.map(|account| BalanceQuery {
            account,
            currencies: [&self.form.input_currency, &self.form.output_currency]
                .into_iter()
                .flatten()
                .cloned()
                .collect(),
        });
        self.balance_params.send_if_modified(|current| {
            let changed = *current != balance_query;
            if changed {
                *current = balance_query.clone();
            }
            changed
        });

        self.refresh_approval();
    }

    fn refresh_approval(&mut self) {
        let key = self.approval_key();
        self.approval.set_requirement(key.clone());

        let query = self.account.zip(key).map(|(owner, approval)| AllowanceQuery { owner, approval });
        self.allowance_params.send_if_modified(|current| {
            let changed = *current != query;
            if changed {
                *current = query.clone();
            }
            changed
        });
    }

    /// Apply a quote result. Returns false when the result was for
    /// parameters the form no longer has.
    pub fn apply_quote(&mut self, request: &QuoteRequest, outcome: QuoteOutcome) -> bool {
        if self.quote_request.as_ref() != Some(request) {
            debug!(amount = %request.amount, "Discarding superseded quote");
            return false;
        }
        self.quote = outcome.into();
        self.refresh_approval();
        true
    }

    pub fn quote_failed(&mut self, request: &QuoteRequest, error: &ProviderError) {
        if self.quote_request.as_ref() == Some(request) {
            warn!("Quote failed: {}", error);
        }
    }

    /// Apply a balance read. Reads for another account are discarded.
    pub fn apply_balance(&mut self, account: Address, balance: Amount) -> bool {
        if self.account != Some(account) {
            debug!(%account, "Discarding balance for disconnected account");
            return false;
        }
        self.balances
            .insert((account, balance.currency().clone()), balance);
        true
    }

    pub fn apply_allowance(&mut self, query: &AllowanceQuery, allowance: Uint256) -> ApprovalState {
        if self.account != Some(query.owner) {
            debug!(owner = %query.owner, "Discarding allowance for disconnected account");
            return self.approval.state();
        }
        self.approval.on_allowance(&query.approval, allowance)
    }

    fn balance_of(&self, currency: Option<&Currency>) -> Option<Amount> {
        let account = self.account?;
        self.balances.get(&(account, currency?.clone())).cloned()
    }

    /// Derived view of the form, recomputed only when an input changed
    pub fn derived(&mut self) -> &DerivedSwapInfo {
        let balances = SwapPair::new(
            self.balance_of(self.form.input_currency.as_ref()),
            self.balance_of(self.form.output_currency.as_ref()),
        );
        let key = (
            self.form.clone(),
            self.account,
            balances,
            self.quote.clone(),
            self.settings.slippage(),
        );
        self.memo
            .get_or_compute(key, |(form, account, balances, quote, slippage)| {
                derive_swap_info(form, *account, balances, quote, slippage)
            })
    }

    pub fn price_breakdown(&mut self) -> Option<PriceBreakdown> {
        let thresholds = self.settings.price_impact.clone();
        self.derived()
            .trade
            .as_ref()
            .map(|trade| price_breakdown(trade, &thresholds))
    }

    /// Allowance the current trade needs, `None` when there is no trade or
    /// no known spender for it
    pub fn approval_key(&mut self) -> Option<ApprovalKey> {
        let contracts = self.settings.contracts.clone();
        let info = self.derived();
        let trade = info.trade.as_ref()?;
        let spender = trade.spender(&contracts)?;
        let required = info.slippage_adjusted.as_ref()?.maximum_amount_in.clone();
        Some(ApprovalKey {
            token: required.currency().clone(),
            spender,
            required: required.raw(),
        })
    }

    /// Largest input the "MAX" button may fill in, keeping the configured
    /// gas reserve back on native balances
    pub fn max_input(&self) -> Option<Amount> {
        let balance = self.balance_of(self.form.input_currency.as_ref())?;
        max_amount_spend(
            Some(&balance),
            Uint256::from(self.settings.native_gas_reserve),
        )
    }

    /// Type the maximum spendable input into the input field
    pub fn fill_max_input(&mut self) -> Option<Amount> {
        let max = self.max_input()?;
        self.dispatch(SwapAction::TypeInput {
            field: SwapField::Input,
            value: max.to_exact(),
        });
        Some(max)
    }

    pub fn acknowledge_price_impact(&mut self) {
        self.price_impact_acknowledged = true;
    }

    /// First reason the submit action is disabled, if any
    pub fn submit_gate(&mut self) -> Result<(), SubmitBlock> {
        let info = self.derived().clone();
        if let Some(error) = info.input_error {
            return Err(SubmitBlock::Input(error));
        }
        let Some(trade) = info.trade.as_ref() else {
            return Err(SubmitBlock::AwaitingQuote);
        };
        let input = trade.input_currency();
        if !input.is_native() && trade.spender(&self.settings.contracts).is_none() {
            return Err(SubmitBlock::MissingSpender {
                symbol: input.symbol.clone(),
            });
        }
        if self.approval.blocks_submit() {
            return Err(SubmitBlock::ApprovalRequired {
                symbol: trade.input_currency().symbol.clone(),
            });
        }

        let severity = price_breakdown(trade, &self.settings.price_impact).severity;
        if severity.requires_expert_mode() && !self.settings.expert_mode {
            return Err(SubmitBlock::PriceImpactTooHigh);
        }
        if severity.requires_acknowledgement()
            && !(self.price_impact_acknowledged || self.settings.expert_mode)
        {
            return Err(SubmitBlock::PriceImpactUnacknowledged);
        }

        if let Some(confirmation) = &self.confirmation {
            if confirmation.needs_acceptance(Some(trade)) {
                return Err(SubmitBlock::StaleTrade);
            }
        }
        Ok(())
    }

    pub fn can_submit(&mut self) -> bool {
        self.submit_gate().is_ok()
    }

    /// Open the confirmation prompt on the current trade
    pub fn begin_confirmation(&mut self) -> Result<Trade, SubmitBlock> {
        self.confirmation = None;
        self.submit_gate()?;
        let trade = self.derived().trade.clone().ok_or(SubmitBlock::AwaitingQuote)?;
        self.confirmation = Some(Confirmation::open(trade.clone()));
        Ok(trade)
    }

    /// Whether the open confirmation shows an outdated trade
    pub fn needs_acceptance(&mut self) -> bool {
        let latest = self.derived().trade.clone();
        self.confirmation
            .as_ref()
            .is_some_and(|c| c.needs_acceptance(latest.as_ref()))
    }

    /// The user accepted the updated trade shown in the confirmation
    pub fn accept_updated_trade(&mut self) -> Result<(), Error> {
        let latest = self.derived().trade.clone().ok_or(SubmitBlock::AwaitingQuote)?;
        let confirmation = self
            .confirmation
            .as_mut()
            .ok_or_else(|| Error::InvalidTransition("no open confirmation".to_string()))?;
        confirmation.accept(latest);
        Ok(())
    }

    pub fn cancel_confirmation(&mut self) {
        self.confirmation = None;
    }

    /// Send an approval for the current requirement
    pub async fn approve(&mut self, submitter: &dyn TransactionSubmitter) -> Result<TxHash, Error> {
        let key = self
            .approval
            .key()
            .cloned()
            .ok_or_else(|| Error::InvalidTransition("nothing to approve".to_string()))?;
        if self.approval.state() != ApprovalState::NotApproved {
            return Err(Error::InvalidTransition(format!(
                "cannot approve from {:?}",
                self.approval.state()
            )));
        }

        let amount = amount_to_approve(key.required, self.settings.approve_exact);
        match submitter.approve(&key.token, key.spender, amount).await {
            Ok(tx) => {
                self.approval.on_approval_submitted(&key, tx.clone())?;
                Ok(tx)
            }
            Err(e) => Err(classified(&e, "Approval")),
        }
    }

    /// The pending approval transaction failed or was dropped
    pub fn approval_failed(&mut self) -> Result<(), Error> {
        let key = self
            .approval
            .key()
            .cloned()
            .ok_or_else(|| Error::InvalidTransition("no approval requirement".to_string()))?;
        self.approval.on_approval_failed(&key)
    }

    /// Send the confirmed trade.
    ///
    /// On success the form is reset and the confirmation closed. On failure
    /// the form is kept so the user can retry.
    pub async fn execute(
        &mut self,
        submitter: &dyn TransactionSubmitter,
    ) -> Result<SubmissionRecord, Error> {
        self.submit_gate()?;
        let latest = self.derived().trade.clone();
        let confirmation = self
            .confirmation
            .as_ref()
            .ok_or_else(|| Error::InvalidTransition("no open confirmation".to_string()))?;
        let trade = confirmation.check_before_send(latest.as_ref())?.clone();

        let account = self.account.ok_or(SubmitBlock::Input(InputError::NoAccount))?;
        let recipient = match &self.form.recipient {
            Some(text) => text.trim().parse::<Address>()?,
            None => account,
        };
        let slippage = self.settings.slippage();
        let ttl = chrono::Duration::from_std(self.settings.deadline_ttl())
            .map_err(|e| Error::Config(format!("Invalid deadline: {}", e)))?;
        let deadline = (Utc::now() + ttl).timestamp();
        let request = ExecutionRequest {
            minimum_amount_out: trade.minimum_amount_out(&slippage)?,
            maximum_amount_in: trade.maximum_amount_in(&slippage)?,
            trade,
            recipient,
            deadline,
        };

        match submitter.execute(&request).await {
            Ok(tx) => {
                let summary = summarize(&request.trade);
                info!(tx = %tx, "{}", summary);
                self.confirmation = None;
                self.dispatch(SwapAction::Reset);
                Ok(SubmissionRecord { tx, summary, request })
            }
            Err(e) => Err(classified(&e, "Swap")),
        }
    }

    pub fn quote_lease(
        &self,
        quoter: Arc<dyn TradeQuoter>,
        sender: mpsc::UnboundedSender<Keyed<QuoteRequest, QuoteOutcome>>,
    ) -> PollLease {
        spawn_poll(
            "quote",
            self.settings.quote_poll_interval(),
            self.quote_params.subscribe(),
            sender,
            move |request: QuoteRequest| {
                let quoter = quoter.clone();
                async move { quoter.quote(&request).await }
            },
        )
    }

    pub fn allowance_lease(
        &self,
        reader: Arc<dyn ChainReader>,
        sender: mpsc::UnboundedSender<Keyed<AllowanceQuery, Uint256>>,
    ) -> PollLease {
        spawn_poll(
            "allowance",
            self.settings.allowance_poll_interval(),
            self.allowance_params.subscribe(),
            sender,
            move |query: AllowanceQuery| {
                let reader = reader.clone();
                async move {
                    reader
                        .allowance(query.owner, &query.approval.token, query.approval.spender)
                        .await
                }
            },
        )
    }

    pub fn balance_lease(
        &self,
        reader: Arc<dyn ChainReader>,
        sender: mpsc::UnboundedSender<Keyed<BalanceQuery, Vec<Amount>>>,
    ) -> PollLease {
        spawn_poll(
            "balance",
            self.settings.quote_poll_interval(),
            self.balance_params.subscribe(),
            sender,
            move |query: BalanceQuery| {
                let reader = reader.clone();
                async move {
                    let mut balances = Vec::with_capacity(query.currencies.len());
                    for currency in &query.currencies {
                        balances.push(reader.balance_of(query.account, currency).await?);
                    }
                    Ok::<_, ProviderError>(balances)
                }
            },
        )
    }
}

fn summarize(trade: &Trade) -> String {
    format!(
        "Swap {} {} for {} {}",
        trade.input_amount().to_significant(6),
        trade.input_currency().symbol,
        trade.output_amount().to_significant(6),
        trade.output_currency().symbol
    )
}

/// Classify and log a submission failure
fn classified(error: &ProviderError, action: &str) -> Error {
    let kind = ExecutionError::classify(error);
    if kind.is_benign() {
        info!("{} rejected by user", action);
    } else {
        warn!(detail = %error, "{} failed: {}", action, kind);
    }
    Error::Execution(kind)
}
