// 📊 County Summary - in / out / net cards for the selected county

use crate::loader::CountMap;
use serde::Serialize;

pub const IN_COLOR: &str = "#00cc66";
pub const OUT_COLOR: &str = "#ff3300";
pub const IN_BG_COLOR: &str = "#e6fff2";
pub const OUT_BG_COLOR: &str = "#ffe6e6";
pub const NET_BG_COLOR: &str = "whitesmoke";

/// Format with comma thousands separators: 20000 → "20,000", -1500 → "-1,500"
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountySummary {
    pub in_migration: u64,
    pub out_migration: u64,
}

impl CountySummary {
    /// Missing entries count as zero
    pub fn lookup(code: &str, in_totals: &CountMap, out_totals: &CountMap) -> Self {
        Self {
            in_migration: in_totals.get(code).copied().unwrap_or(0),
            out_migration: out_totals.get(code).copied().unwrap_or(0),
        }
    }

    pub fn net(&self) -> i64 {
        self.in_migration as i64 - self.out_migration as i64
    }

    /// Zero counts as a gain
    pub fn is_gain(&self) -> bool {
        self.net() >= 0
    }

    pub fn cards(&self) -> [SummaryCard; 3] {
        let net = self.net();
        let net_color = if self.is_gain() { IN_COLOR } else { OUT_COLOR };
        let sign = if net > 0 { "+" } else { "" };

        [
            SummaryCard {
                title: "In-Migration",
                value: format_thousands(self.in_migration as i64),
                caption: "People moved into this county",
                color: IN_COLOR,
                background: IN_BG_COLOR,
            },
            SummaryCard {
                title: "Out-Migration",
                value: format_thousands(self.out_migration as i64),
                caption: "People moved out of this county",
                color: OUT_COLOR,
                background: OUT_BG_COLOR,
            },
            SummaryCard {
                title: "Net Migration",
                value: format!("{}{}", sign, format_thousands(net)),
                caption: if self.is_gain() {
                    "Population gain"
                } else {
                    "Population loss"
                },
                color: net_color,
                background: NET_BG_COLOR,
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryCard {
    pub title: &'static str,
    pub value: String,
    pub caption: &'static str,
    pub color: &'static str,
    pub background: &'static str,
}
