// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Pilgrim Ledger Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use pilgrim_ledger::{
    AccountId, Clock, Currency, Engine, LedgerError, SystemClock, TransferRoute, WithdrawSource,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// Pilgrim Ledger - Process bank operation CSV files
///
/// Reads operations from a CSV file, runs them through the balance-mutation
/// engine, and outputs account snapshots to stdout.
#[derive(Parser, Debug)]
#[command(name = "pilgrim-ledger")]
#[command(about = "A bank simulation engine that processes operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,account,counterparty,currency,amount,description
    /// Example: cargo run -- operations.csv > accounts.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Seed for the trading profit generator (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the audit feed to stderr after processing
    #[arg(long)]
    audit: bool,
}

fn main() {
    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let engine = match process_operations(BufReader::new(file), &mut rng) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error processing operations: {}", e);
            process::exit(1);
        }
    };

    // Settle whatever lifecycle transitions are already due.
    engine.poll_transfers(&SystemClock);

    if args.audit {
        for event in engine.drain_audit() {
            eprintln!("{}", event);
        }
    }

    if let Err(e) = write_accounts(&engine, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, account, counterparty, currency, amount, description`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    account: u32,
    #[serde(default)]
    counterparty: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    #[serde(default)]
    description: Option<String>,
}

impl CsvRecord {
    fn currency(&self) -> Option<Currency> {
        self.currency.as_deref().and_then(Currency::parse)
    }

    fn counterparty(&self) -> &str {
        self.counterparty.as_deref().unwrap_or("")
    }

    fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Runs one parsed record against the engine.
///
/// Returns `Ok(false)` when the record's op or fields don't parse; the row
/// is skipped, matching the silent-failure convention for malformed input.
fn apply_record(
    engine: &Engine,
    record: &CsvRecord,
    rng: &mut StdRng,
    clock: &dyn Clock,
) -> Result<bool, LedgerError> {
    let id = AccountId(record.account);

    match record.op.to_lowercase().as_str() {
        "create" => engine.create_account(id)?,
        "delete" => engine.delete_account(id)?,
        "credit" => {
            let (Some(currency), Some(amount)) = (record.currency(), record.amount) else {
                return Ok(false);
            };
            engine.admin_credit(id, currency, amount, record.description(), clock)?;
        }
        "debit" => {
            let (Some(currency), Some(amount)) = (record.currency(), record.amount) else {
                return Ok(false);
            };
            engine.admin_debit(id, currency, amount, record.description(), clock)?;
        }
        "receive" => {
            let (Some(currency), Some(amount)) = (record.currency(), record.amount) else {
                return Ok(false);
            };
            engine.receive_external(id, currency, amount, record.description(), clock)?;
        }
        "transfer" => {
            let (Some(currency), Some(amount)) = (record.currency(), record.amount) else {
                return Ok(false);
            };
            let Some(recipient) = record.counterparty.as_deref().and_then(|c| c.parse().ok())
            else {
                return Ok(false);
            };
            engine.local_transfer(
                id,
                AccountId(recipient),
                currency,
                amount,
                record.description(),
                clock,
            )?;
        }
        "interbank" | "international" => {
            let (Some(currency), Some(amount)) = (record.currency(), record.amount) else {
                return Ok(false);
            };
            let route = if record.op.eq_ignore_ascii_case("interbank") {
                TransferRoute::LocalInterbank
            } else {
                TransferRoute::International
            };
            engine.external_transfer(
                id,
                route,
                currency,
                amount,
                record.counterparty(),
                record.description(),
                clock,
            )?;
        }
        "withdraw" => {
            let (Some(currency), Some(amount)) = (record.currency(), record.amount) else {
                return Ok(false);
            };
            engine.withdraw(
                id,
                WithdrawSource::Main(currency),
                amount,
                record.counterparty(),
                clock,
            )?;
        }
        "withdraw-profit" => {
            let Some(amount) = record.amount else {
                return Ok(false);
            };
            engine.withdraw(
                id,
                WithdrawSource::ProfitBalance,
                amount,
                record.counterparty(),
                clock,
            )?;
        }
        "withdraw-robot" => {
            let Some(amount) = record.amount else {
                return Ok(false);
            };
            engine.withdraw(
                id,
                WithdrawSource::RobotProfit,
                amount,
                record.counterparty(),
                clock,
            )?;
        }
        "start-mining" => engine.set_mining_active(id, true)?,
        "stop-mining" => engine.set_mining_active(id, false)?,
        "mine" => {
            engine.mine(id, clock)?;
        }
        "automine" => {
            engine.auto_mine(id, clock)?;
        }
        "robot" => {
            let _ = engine.robot_trade(id, clock)?;
        }
        "forex" => {
            engine.forex_trade_tick(id, rng, clock)?;
        }
        "pair" => {
            let Some(pair) = record.counterparty.as_deref() else {
                return Ok(false);
            };
            engine.pair_trade(id, pair, rng, clock)?;
        }
        "sync" => {
            let _ = engine.daily_sync(id, clock)?;
        }
        "sweep" => {
            let _ = engine.sweep_profit_to_main(id, clock)?;
        }
        "sweep-pool" => {
            let _ = engine.sweep_profit_pool();
        }
        _ => return Ok(false),
    }

    Ok(true)
}

/// Process operations from a CSV reader.
///
/// Streaming parse; malformed rows and rejected operations are skipped
/// without stopping the run.
///
/// # CSV Format
///
/// Expected columns: `op, account, counterparty, currency, amount, description`
/// - `op`: Operation name (create, credit, debit, transfer, withdraw, ...)
/// - `account`: Account ID (u32)
/// - `counterparty`: Recipient account, beneficiary, or pair name (optional)
/// - `currency`: One of NGN, USD, EUR, GBP (optional for some ops)
/// - `amount`: Decimal amount (optional for some ops)
/// - `description`: Free text carried onto the ledger entry (optional)
///
/// # Example
///
/// ```csv
/// op,account,counterparty,currency,amount,description
/// create,1,,,,
/// credit,1,,USD,100.00,opening deposit
/// transfer,1,2,USD,25.00,lunch money
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
/// Individual operation errors are logged in debug mode but don't stop
/// processing.
pub fn process_operations<R: Read>(reader: R, rng: &mut StdRng) -> Result<Engine, csv::Error> {
    let engine = Engine::new();
    let clock = SystemClock;

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => match apply_record(&engine, &record, rng, &clock) {
                Ok(true) => {}
                Ok(false) => {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping invalid operation record: {:?}", record.op);
                }
                Err(_e) => {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping op {} for acct {}: {}", record.op, record.account, _e);
                }
            },
            Err(_e) => {
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", _e);
                continue;
            }
        }
    }

    Ok(engine)
}

/// Write account snapshots to a CSV writer.
///
/// Columns: `account, ngn, usd, eur, gbp, profit, robot, coin` with fiat
/// balances rounded to 2 decimal places and the coin balance to 8.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_accounts<W: Write>(engine: &Engine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    let mut result = Ok(());
    engine.for_each_account(|account| {
        if result.is_ok() {
            result = wtr.serialize(account.as_ref());
        }
    });
    result?;

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    fn run(csv: &str) -> Engine {
        let mut rng = StdRng::seed_from_u64(1);
        process_operations(Cursor::new(csv), &mut rng).unwrap()
    }

    #[test]
    fn parse_create_and_credit() {
        let engine = run(
            "op,account,counterparty,currency,amount,description\n\
             create,1,,,,\n\
             credit,1,,USD,100.00,opening deposit\n",
        );

        let account = engine.account(AccountId(1)).unwrap();
        assert_eq!(account.balance(Currency::Usd), dec!(100.00));
        assert_eq!(engine.aggregates().profit_pool, dec!(2.0000));
    }

    #[test]
    fn parse_local_transfer() {
        let engine = run(
            "op,account,counterparty,currency,amount,description\n\
             create,1,,,,\n\
             create,2,,,,\n\
             credit,1,,NGN,1000,seed\n\
             transfer,1,2,NGN,400,rent\n",
        );

        assert_eq!(
            engine.account(AccountId(1)).unwrap().balance(Currency::Ngn),
            dec!(600)
        );
        assert_eq!(
            engine.account(AccountId(2)).unwrap().balance(Currency::Ngn),
            dec!(400)
        );
    }

    #[test]
    fn rejected_operation_does_not_stop_processing() {
        let engine = run(
            "op,account,counterparty,currency,amount,description\n\
             create,1,,,,\n\
             credit,1,,NGN,1000,seed\n\
             debit,1,,NGN,1500,too much\n\
             debit,1,,NGN,200,ok\n",
        );

        assert_eq!(
            engine.account(AccountId(1)).unwrap().balance(Currency::Ngn),
            dec!(800)
        );
    }

    #[test]
    fn parse_with_whitespace() {
        let engine = run(
            "op,account,counterparty,currency,amount,description\n\
              create , 1 ,,,,\n\
              credit , 1 ,, usd , 50.00 , seed \n",
        );
        assert_eq!(
            engine.account(AccountId(1)).unwrap().balance(Currency::Usd),
            dec!(50.00)
        );
    }

    #[test]
    fn skip_malformed_rows() {
        let engine = run(
            "op,account,counterparty,currency,amount,description\n\
             create,1,,,,\n\
             nonsense,row,here,,,\n\
             credit,1,,GBP,10,seed\n",
        );
        assert_eq!(
            engine.account(AccountId(1)).unwrap().balance(Currency::Gbp),
            dec!(10)
        );
    }

    #[test]
    fn mining_ops_round_trip() {
        let engine = run(
            "op,account,counterparty,currency,amount,description\n\
             create,1,,,,\n\
             start-mining,1,,,,\n\
             mine,1,,,,\n\
             automine,1,,,,\n",
        );

        let account = engine.account(AccountId(1)).unwrap();
        assert_eq!(account.coin_balance(), dec!(0.000002) + dec!(0.0000001));
    }

    #[test]
    fn withdrawal_opens_a_transfer_record() {
        let engine = run(
            "op,account,counterparty,currency,amount,description\n\
             create,1,,,,\n\
             credit,1,,USD,101.00,seed\n\
             withdraw,1,GTB 0123,USD,100.00,\n",
        );

        let account = engine.account(AccountId(1)).unwrap();
        assert_eq!(account.balance(Currency::Usd), Decimal::ZERO);
        assert!(engine.transfer(pilgrim_ledger::TransferId(0)).is_some());
    }

    #[test]
    fn write_accounts_to_csv() {
        let engine = run(
            "op,account,counterparty,currency,amount,description\n\
             create,1,,,,\n\
             credit,1,,USD,100.5,seed\n",
        );

        let mut output = Vec::new();
        write_accounts(&engine, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("account,ngn,usd,eur,gbp,profit,robot,coin"));
        assert!(output_str.contains("100.5"));
    }

    #[test]
    fn forex_ops_use_the_seeded_rng() {
        let a = run(
            "op,account,counterparty,currency,amount,description\n\
             create,1,,,,\n\
             forex,1,,,,\n",
        );
        let b = run(
            "op,account,counterparty,currency,amount,description\n\
             create,1,,,,\n\
             forex,1,,,,\n",
        );
        assert_eq!(
            a.account(AccountId(1)).unwrap().balance(Currency::Usd),
            b.account(AccountId(1)).unwrap().balance(Currency::Usd)
        );
    }
}
