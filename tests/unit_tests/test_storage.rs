// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use lottery_server_rs::{
    models::bet::{Bet, RawBet},
    storage::{BetStore, WINNING_NUMBER, csv::CsvStore},
};

fn temp_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("bets-{tag}-{}.csv", std::process::id()))
}

fn raw(agency: &str, document: &str, number: &str) -> RawBet {
    RawBet {
        agency: agency.into(),
        first_name: "Santiago Lionel".into(),
        last_name: "Lorca".into(),
        document: document.into(),
        birthdate: "1999-03-17".into(),
        number: number.into(),
    }
}

#[test]
fn stores_and_loads_in_order() -> Result<()> {
    let path = temp_path("round-trip");
    let _ = fs::remove_file(&path);
    let mut store = CsvStore::new(path.clone());

    store.store_bets(vec![raw("1", "30904465", "7574"), raw("2", "11111111", "42")])?;
    store.store_bets(vec![raw("1", "22222222", "7")])?;

    let bets = store.load_bets()?;
    assert_eq!(bets.len(), 3);
    assert_eq!(
        bets.iter().map(|b| b.document.as_str()).collect::<Vec<_>>(),
        vec!["30904465", "11111111", "22222222"]
    );
    assert_eq!(bets[0].agency, 1);
    assert_eq!(bets[0].number, 7574);
    assert_eq!(
        bets[0].birthdate,
        NaiveDate::from_ymd_opt(1999, 3, 17).expect("valid date")
    );

    fs::remove_file(&path)?;
    Ok(())
}

#[test]
fn bad_batch_is_all_or_nothing() -> Result<()> {
    let path = temp_path("all-or-nothing");
    let _ = fs::remove_file(&path);
    let mut store = CsvStore::new(path.clone());

    let result = store.store_bets(vec![
        raw("1", "30904465", "7574"),
        raw("1", "11111111", "not-a-number"),
    ]);
    assert!(result.is_err());
    assert!(store.load_bets()?.is_empty());

    let _ = fs::remove_file(&path);
    Ok(())
}

#[test]
fn missing_file_loads_empty() -> Result<()> {
    let store = CsvStore::new("/nonexistent/dir/never-written.csv");
    assert!(store.load_bets()?.is_empty());
    Ok(())
}

#[test]
fn default_predicate_pays_the_winning_number() {
    let store = CsvStore::new("unused.csv");
    let winner = Bet {
        agency: 1,
        first_name: "Santiago".into(),
        last_name: "Lorca".into(),
        document: "30904465".into(),
        birthdate: NaiveDate::from_ymd_opt(1999, 3, 17).expect("valid date"),
        number: WINNING_NUMBER,
    };
    let loser = Bet { number: WINNING_NUMBER + 1, ..winner.clone() };

    assert!(store.has_won(&winner));
    assert!(!store.has_won(&loser));
}
