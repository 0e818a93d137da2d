use stanza::style::{HAlign, Header, MinWidth, Separator, Styles};
use stanza::table::{Col, Row, Table};

use crate::mc::OddsTable;
use crate::race::{Race, RaceOutcome};

pub fn tabulate_odds(table: &OddsTable) -> Table {
    let mut out = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(20)).with(HAlign::Left)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)).with(Separator(true)),
            vec![
                "Entrant".into(),
                "Wins".into(),
                "Win rate".into(),
                "Odds".into(),
            ],
        ));
    for (index, result) in table.results.iter().enumerate() {
        out.push_row(Row::new(
            Styles::default(),
            vec![
                result.name.clone().into(),
                format!("{}", result.wins).into(),
                format!("{:.1}%", table.win_rate(index) * 100.0).into(),
                format!("{}", result.odds).into(),
            ],
        ));
    }
    out
}

pub fn tabulate_outcome(race: &Race, outcome: &RaceOutcome) -> Table {
    let mut out = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(5)).with(HAlign::Centred)),
            Col::new(Styles::default().with(MinWidth(20)).with(HAlign::Left)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)).with(Separator(true)),
            vec!["Place".into(), "Entrant".into(), "Tick".into()],
        ));
    for finisher in &outcome.finishers {
        out.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", finisher.place).into(),
                race.names()[finisher.runner].clone().into(),
                format!("{}", finisher.tick).into(),
            ],
        ));
    }
    out
}
