//! Derive a swap or liquidity removal form from the command line and print
//! the result as JSON.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::debug;

use dex_intent::{
    codec,
    currency::{Address, Currency},
    field::{FieldResolver, RemoveField, SwapField},
    logging::{init_logging, LoggingConfig},
    price_impact::price_breakdown,
    swap::{derive_swap_info, SlippageTolerance, SwapAction, SwapFormState, SwapPair},
    trade::{QuoteState, Route, RouteHop, SwapTrade, Trade, TradeType},
    Amount, Percent, PoolSnapshot, Settings, Uint256,
};

#[derive(Parser)]
#[command(name = "dex-intent")]
#[command(about = "Swap and liquidity form derivation")]
#[command(version)]
struct Args {
    /// Settings directory (defaults to DEX_CONFIG_DIR or ./config)
    #[arg(long, global = true)]
    config_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum FieldArg {
    Input,
    Output,
}

#[derive(Clone, Copy, ValueEnum)]
enum RemoveFieldArg {
    Percent,
    Liquidity,
    CurrencyA,
    CurrencyB,
}

#[derive(Subcommand)]
enum Command {
    /// Derive a swap form against a quoted amount
    Derive {
        #[arg(long)]
        input_symbol: String,
        #[arg(long, default_value = "18")]
        input_decimals: u8,
        /// Token address, omit for the native asset
        #[arg(long)]
        input_address: Option<String>,
        #[arg(long)]
        output_symbol: String,
        #[arg(long, default_value = "18")]
        output_decimals: u8,
        #[arg(long)]
        output_address: Option<String>,
        /// Field the amount was typed into
        #[arg(long, value_enum, default_value = "input")]
        field: FieldArg,
        /// Text typed into the field
        #[arg(long, default_value = "")]
        typed: String,
        /// Raw amount the quoter returned for the other field
        #[arg(long)]
        quoted: Option<String>,
        /// Quoted price impact in basis points
        #[arg(long, default_value = "0")]
        impact_bips: u32,
        /// Raw input balance of the account
        #[arg(long)]
        balance: Option<String>,
        /// Slippage tolerance in percent, e.g. 0.5
        #[arg(long)]
        slippage: Option<String>,
        /// Connected account
        #[arg(long)]
        account: Option<String>,
    },
    /// Derive a liquidity removal form
    Remove {
        #[arg(long, value_enum, default_value = "percent")]
        field: RemoveFieldArg,
        #[arg(long)]
        typed: String,
        #[arg(long)]
        user_liquidity: String,
        #[arg(long)]
        total_supply: String,
        #[arg(long)]
        reserve_a: String,
        #[arg(long)]
        reserve_b: String,
        #[arg(long)]
        account: Option<String>,
    },
}

fn currency(chain_id: u64, symbol: &str, decimals: u8, address: Option<&str>) -> Result<Currency> {
    Ok(match address {
        Some(address) => Currency::token(chain_id, address.parse()?, decimals, symbol),
        None => Currency::native(chain_id, decimals, symbol),
    })
}

fn raw(text: &str) -> Result<Uint256> {
    text.parse::<Uint256>()
        .map_err(|e| anyhow!("invalid raw amount '{}': {}", text, e))
}

fn account(text: Option<&str>) -> Result<Option<Address>> {
    text.map(|a| a.parse::<Address>().context("invalid account"))
        .transpose()
}

#[allow(clippy::too_many_arguments)]
fn derive_swap(
    settings: &Settings,
    input: Currency,
    output: Currency,
    field: SwapField,
    typed: String,
    quoted: Option<&str>,
    impact_bips: u32,
    balance: Option<&str>,
    slippage: Option<&str>,
    account: Option<Address>,
) -> Result<serde_json::Value> {
    let slippage = match slippage {
        Some(text) => SlippageTolerance::parse(text)?,
        None => SlippageTolerance::from_bips(settings.slippage_bips)?,
    };

    let form = SwapFormState::with_currencies(input.clone(), output.clone())
        .reduce(&SwapAction::TypeInput { field, value: typed });

    let typed_amount = form
        .currency(field)
        .and_then(|c| codec::parse(form.typed_value(), c).ok().flatten());
    let quote = match (typed_amount, quoted) {
        (Some(typed_amount), Some(quoted)) => {
            let (input_amount, output_amount, trade_type) = match field {
                SwapField::Input => (
                    typed_amount,
                    Amount::from_raw(output.clone(), raw(quoted)?),
                    TradeType::ExactInput,
                ),
                SwapField::Output => (
                    Amount::from_raw(input.clone(), raw(quoted)?),
                    typed_amount,
                    TradeType::ExactOutput,
                ),
            };
            let route = Route::new(
                vec![input.clone(), output.clone()],
                vec![RouteHop {
                    pool: Address::new([0u8; 20]),
                    fee_bips: 30,
                }],
            )?;
            QuoteState::Ready(Trade::Swap(SwapTrade {
                trade_type,
                route,
                input_amount,
                output_amount,
                price_impact: Percent::from_bips(impact_bips),
            }))
        }
        _ => QuoteState::Idle,
    };

    let balances = SwapPair::new(
        balance
            .map(|b| raw(b).map(|r| Amount::from_raw(input.clone(), r)))
            .transpose()?,
        None,
    );
    let info = derive_swap_info(&form, account, &balances, &quote, &slippage.percent());
    debug!(error = ?info.input_error, "Derived swap form");

    let breakdown = info
        .trade
        .as_ref()
        .map(|trade| price_breakdown(trade, &settings.price_impact));
    let execution_price = info
        .trade
        .as_ref()
        .and_then(|trade| trade.execution_price().ok())
        .map(|price| price.to_significant(6));

    Ok(json!({
        "derived": info,
        "input_text": info.formatted_amount(&form, SwapField::Input),
        "output_text": info.formatted_amount(&form, SwapField::Output),
        "execution_price": execution_price,
        "price_breakdown": breakdown,
        "slippage_percent": slippage.percent().to_fixed(2),
        "slippage_warning": slippage.warning(),
    }))
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging(&LoggingConfig::from_env())?;

    let args = Args::parse();
    let settings = Settings::load(args.config_dir.as_deref())?;

    let output = match args.command {
        Command::Derive {
            input_symbol,
            input_decimals,
            input_address,
            output_symbol,
            output_decimals,
            output_address,
            field,
            typed,
            quoted,
            impact_bips,
            balance,
            slippage,
            account: account_text,
        } => {
            let input = currency(
                settings.chain_id,
                &input_symbol,
                input_decimals,
                input_address.as_deref(),
            )?;
            let output = currency(
                settings.chain_id,
                &output_symbol,
                output_decimals,
                output_address.as_deref(),
            )?;
            let field = match field {
                FieldArg::Input => SwapField::Input,
                FieldArg::Output => SwapField::Output,
            };
            derive_swap(
                &settings,
                input,
                output,
                field,
                typed,
                quoted.as_deref(),
                impact_bips,
                balance.as_deref(),
                slippage.as_deref(),
                account(account_text.as_deref())?,
            )?
        }
        Command::Remove {
            field,
            typed,
            user_liquidity,
            total_supply,
            reserve_a,
            reserve_b,
            account: account_text,
        } => {
            let lp = Currency::token(settings.chain_id, Address::new([0xcc; 20]), 0, "LP");
            let pool = PoolSnapshot {
                token_a: Currency::token(settings.chain_id, Address::new([0xaa; 20]), 0, "A"),
                token_b: Currency::token(settings.chain_id, Address::new([0xbb; 20]), 0, "B"),
                liquidity_token: lp.clone(),
                reserve_a: raw(&reserve_a)?,
                reserve_b: raw(&reserve_b)?,
                total_supply: raw(&total_supply)?,
            };
            let field = match field {
                RemoveFieldArg::Percent => RemoveField::LiquidityPercent,
                RemoveFieldArg::Liquidity => RemoveField::Liquidity,
                RemoveFieldArg::CurrencyA => RemoveField::CurrencyA,
                RemoveFieldArg::CurrencyB => RemoveField::CurrencyB,
            };
            let mut form = FieldResolver::new();
            form.on_user_input(field, typed);
            let liquidity = Amount::from_raw(lp, raw(&user_liquidity)?);
            let info = dex_intent::derive_burn_info(
                &form,
                account(account_text.as_deref())?,
                Some(&pool),
                Some(&liquidity),
            );
            json!({
                "derived": info,
                "pool_share": info.pool_share_display(),
                "minimum_amounts": info.minimum_amounts(&settings.slippage()),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
