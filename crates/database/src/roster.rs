use crate::error::DbError;
use crate::repository::DbRepository;
use chrono::NaiveDate;
use core_types::CoreError;
use serde::{Deserialize, Serialize};

/// The league's standing roster as `(name, birthdate)` pairs.
pub const DEFAULT_ROSTER: [(&str, &str); 18] = [
    ("Adrian Huck", "2007-10-02"),
    ("Ferdi Forcher", "1995-03-21"),
    ("Johannes Boos", "2002-08-25"),
    ("Tom Altmann", "2007-01-12"),
    ("Linus Eberle", "2005-03-12"),
    ("Kaj Leimgruber", "2006-08-18"),
    ("Maximilian Gangloff", "1998-08-04"),
    ("Luka Misetic", "1998-03-29"),
    ("Maximilian Maier", "2007-12-08"),
    ("Tim Peter", "1998-03-11"),
    ("Stefan Schmitt", "1993-09-17"),
    ("Tim Schreck", "1997-02-03"),
    ("Salomon Böhm", "2007-08-30"),
    ("Johannes Höll", "1993-04-23"),
    ("Jan Keller", "1998-11-14"),
    ("Jacob Kölmel", "2005-10-28"),
    ("Jaron Siefritz", "2008-01-12"),
    ("Daniel Leppert", "1997-07-07"),
];

/// How many roster entries a seeding run inserted and how many it left alone
/// because a player of that name already existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub added: u64,
    pub skipped: u64,
}

impl DbRepository {
    /// Inserts every default roster player whose name is not taken yet.
    /// Idempotent: a second run adds nothing.
    pub async fn seed_default_roster(&self) -> Result<SeedReport, DbError> {
        let mut tx = self.begin_write().await?;
        let mut report = SeedReport { added: 0, skipped: 0 };

        for (name, birthdate) in DEFAULT_ROSTER {
            let birthdate = NaiveDate::parse_from_str(birthdate, "%Y-%m-%d").map_err(|e| {
                CoreError::Validation(format!("bad roster birthdate for {name}: {e}"))
            })?;
            let result = sqlx::query(
                "INSERT INTO players (name, birthdate) VALUES (?, ?) ON CONFLICT (name) DO NOTHING",
            )
            .bind(name)
            .bind(birthdate)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 1 {
                report.added += 1;
            } else {
                report.skipped += 1;
            }
        }

        tx.commit().await?;
        tracing::info!(added = report.added, skipped = report.skipped, "Seeded default roster.");
        Ok(report)
    }
}
