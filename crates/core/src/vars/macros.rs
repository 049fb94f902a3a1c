//! Built-in macros.
//!
//! Macro names live under a reserved underscore prefix and resolve only when
//! the user variable map does not already provide the name. Time-valued
//! macros read `MacroContext::now`, captured once per compile, so a compile
//! is internally consistent even across midnight. Counter macros are
//! snapshot reads through a [`CounterSource`]; the core never commits.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use uuid::Uuid;

// ── Counter scopes ──────────────────────────────────────────────────────

/// The key set identifying an independently incrementing counter.
///
/// Daily scopes embed the local date (derived from the compile's configured
/// timezone) in their key, so each day starts a fresh counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CounterScope {
    /// One counter for the whole installation.
    Global,
    /// One counter per local date.
    Daily {
        /// The local date in the compile's timezone.
        date: NaiveDate,
    },
    /// One counter per printer.
    Printer {
        /// The printer identifier.
        printer_id: String,
    },
    /// One counter per printer per local date.
    PrinterDaily {
        /// The printer identifier.
        printer_id: String,
        /// The local date in the compile's timezone.
        date: NaiveDate,
    },
    /// One counter per template.
    Template {
        /// The template name.
        template_name: String,
    },
    /// One counter per template per local date.
    TemplateDaily {
        /// The template name.
        template_name: String,
        /// The local date in the compile's timezone.
        date: NaiveDate,
    },
}

impl CounterScope {
    /// Stable storage key for this scope.
    pub fn key(&self) -> String {
        match self {
            CounterScope::Global => "global".to_owned(),
            CounterScope::Daily { date } => format!("daily-{date}"),
            CounterScope::Printer { printer_id } => format!("printer-{printer_id}"),
            CounterScope::PrinterDaily { printer_id, date } => {
                format!("printer-{printer_id}-{date}")
            }
            CounterScope::Template { template_name } => format!("template-{template_name}"),
            CounterScope::TemplateDaily {
                template_name,
                date,
            } => format!("template-{template_name}-{date}"),
        }
    }
}

/// Snapshot read access to the counter store.
///
/// The compiler only ever peeks; committing an increment is the print
/// path's job and happens at most once per successful submission.
pub trait CounterSource {
    /// Current value of the counter identified by `scope`.
    fn peek(&self, scope: &CounterScope) -> u64;
}

// ── Context ─────────────────────────────────────────────────────────────

/// Context the built-in macros resolve against.
#[derive(Clone, Copy)]
pub struct MacroContext<'a> {
    /// The compile's single "now", in the configured timezone.
    pub now: DateTime<FixedOffset>,
    /// Value of `_draft_id`; empty when not provided.
    pub draft_id: Option<&'a str>,
    /// Value of `_printer_id`; empty when not provided. Also keys the
    /// printer counter scopes.
    pub printer_id: Option<&'a str>,
    /// Value of `_template_name`; empty when not provided. Also keys the
    /// template counter scopes.
    pub template_name: Option<&'a str>,
    /// Counter snapshot reads; counters resolve to 0 without a source.
    pub counters: Option<&'a dyn CounterSource>,
}

impl Default for MacroContext<'_> {
    fn default() -> Self {
        Self {
            now: DateTime::<chrono::Utc>::UNIX_EPOCH.fixed_offset(),
            draft_id: None,
            printer_id: None,
            template_name: None,
            counters: None,
        }
    }
}

impl<'a> MacroContext<'a> {
    /// Context at the current wall-clock time in the system's local offset.
    pub fn local_now() -> Self {
        Self {
            now: chrono::Local::now().fixed_offset(),
            ..Self::default()
        }
    }

    /// Set the capture time (builder pattern).
    #[must_use]
    pub fn at(mut self, now: DateTime<FixedOffset>) -> Self {
        self.now = now;
        self
    }

    /// Set the draft id (builder pattern).
    #[must_use]
    pub fn with_draft_id(mut self, draft_id: &'a str) -> Self {
        self.draft_id = Some(draft_id);
        self
    }

    /// Set the printer id (builder pattern).
    #[must_use]
    pub fn with_printer_id(mut self, printer_id: &'a str) -> Self {
        self.printer_id = Some(printer_id);
        self
    }

    /// Set the template name (builder pattern).
    #[must_use]
    pub fn with_template_name(mut self, template_name: &'a str) -> Self {
        self.template_name = Some(template_name);
        self
    }

    /// Set the counter source (builder pattern).
    #[must_use]
    pub fn with_counters(mut self, counters: &'a dyn CounterSource) -> Self {
        self.counters = Some(counters);
        self
    }

    fn peek(&self, scope: &CounterScope) -> u64 {
        self.counters.map_or(0, |c| c.peek(scope))
    }
}

// ── Resolution ──────────────────────────────────────────────────────────

/// RFC 4648 base-32 alphabet, no padding.
const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Encode a 40-bit value as 8 base-32 characters.
fn short_id(bits: u64) -> String {
    let mut out = String::with_capacity(8);
    for i in (0..8).rev() {
        let idx = ((bits >> (i * 5)) & 0x1f) as usize;
        out.push(BASE32_ALPHABET[idx] as char);
    }
    out
}

/// Compute every built-in macro value for the given context.
pub fn builtin_macros(ctx: &MacroContext<'_>) -> BTreeMap<String, String> {
    let now = ctx.now;
    let date = now.date_naive();
    let opt = |v: Option<&str>| v.unwrap_or("").to_owned();

    let mut map = BTreeMap::new();
    map.insert(
        "_now_iso".to_owned(),
        now.to_rfc3339_opts(SecondsFormat::Secs, false),
    );
    map.insert(
        "_date_yyyy_mm_dd".to_owned(),
        now.format("%Y-%m-%d").to_string(),
    );
    map.insert(
        "_date_dd_mm_yyyy".to_owned(),
        now.format("%d.%m.%Y").to_string(),
    );
    map.insert("_time_hh_mm".to_owned(), now.format("%H:%M").to_string());
    map.insert(
        "_time_hh_mm_ss".to_owned(),
        now.format("%H:%M:%S").to_string(),
    );
    map.insert(
        "_timestamp_ms".to_owned(),
        now.timestamp_millis().to_string(),
    );
    map.insert("_uuid".to_owned(), Uuid::new_v4().to_string());
    map.insert(
        "_short_id".to_owned(),
        short_id(rand::random::<u64>() & 0xff_ffff_ffff),
    );
    map.insert("_draft_id".to_owned(), opt(ctx.draft_id));
    map.insert("_printer_id".to_owned(), opt(ctx.printer_id));
    map.insert("_template_name".to_owned(), opt(ctx.template_name));

    map.insert(
        "_counter_global".to_owned(),
        ctx.peek(&CounterScope::Global).to_string(),
    );
    map.insert(
        "_counter_daily".to_owned(),
        ctx.peek(&CounterScope::Daily { date }).to_string(),
    );
    map.insert(
        "_counter_printer".to_owned(),
        ctx.peek(&CounterScope::Printer {
            printer_id: opt(ctx.printer_id),
        })
        .to_string(),
    );
    map.insert(
        "_counter_printer_daily".to_owned(),
        ctx.peek(&CounterScope::PrinterDaily {
            printer_id: opt(ctx.printer_id),
            date,
        })
        .to_string(),
    );
    map.insert(
        "_counter_template".to_owned(),
        ctx.peek(&CounterScope::Template {
            template_name: opt(ctx.template_name),
        })
        .to_string(),
    );
    map.insert(
        "_counter_template_daily".to_owned(),
        ctx.peek(&CounterScope::TemplateDaily {
            template_name: opt(ctx.template_name),
            date,
        })
        .to_string(),
    );

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fixed_ctx() -> MacroContext<'static> {
        // 2026-08-01 14:30:05 +02:00
        let now = DateTime::parse_from_rfc3339("2026-08-01T14:30:05+02:00").unwrap();
        MacroContext::default().at(now)
    }

    #[test]
    fn time_macros_use_injected_clock() {
        let m = builtin_macros(&fixed_ctx());
        assert_eq!(m["_now_iso"], "2026-08-01T14:30:05+02:00");
        assert_eq!(m["_date_yyyy_mm_dd"], "2026-08-01");
        assert_eq!(m["_date_dd_mm_yyyy"], "01.08.2026");
        assert_eq!(m["_time_hh_mm"], "14:30");
        assert_eq!(m["_time_hh_mm_ss"], "14:30:05");
        // 2026-08-01T12:30:05Z
        assert_eq!(m["_timestamp_ms"], "1785587405000");
    }

    #[test]
    fn uuid_macro_is_v4_shaped() {
        let m = builtin_macros(&fixed_ctx());
        let uuid = &m["_uuid"];
        assert_eq!(uuid.len(), 36);
        assert_eq!(uuid.as_bytes()[14], b'4');
    }

    #[test]
    fn short_id_is_8_base32_chars() {
        let m = builtin_macros(&fixed_ctx());
        let id = &m["_short_id"];
        assert_eq!(id.len(), 8);
        assert!(
            id.bytes().all(|b| BASE32_ALPHABET.contains(&b)),
            "unexpected char in {id}"
        );
    }

    #[test]
    fn short_id_encoding_is_deterministic() {
        assert_eq!(short_id(0), "AAAAAAAA");
        assert_eq!(short_id(0xff_ffff_ffff), "77777777");
        assert_eq!(short_id(1), "AAAAAAAB");
    }

    #[test]
    fn context_ids_default_to_empty() {
        let m = builtin_macros(&fixed_ctx());
        assert_eq!(m["_draft_id"], "");
        assert_eq!(m["_printer_id"], "");
        assert_eq!(m["_template_name"], "");
    }

    #[test]
    fn context_ids_pass_through() {
        let ctx = fixed_ctx()
            .with_draft_id("d-1")
            .with_printer_id("lab-a")
            .with_template_name("asset");
        let m = builtin_macros(&ctx);
        assert_eq!(m["_draft_id"], "d-1");
        assert_eq!(m["_printer_id"], "lab-a");
        assert_eq!(m["_template_name"], "asset");
    }

    struct FakeCounters(HashMap<String, u64>);

    impl CounterSource for FakeCounters {
        fn peek(&self, scope: &CounterScope) -> u64 {
            self.0.get(&scope.key()).copied().unwrap_or(0)
        }
    }

    #[test]
    fn counter_macros_read_scoped_values() {
        let counters = FakeCounters(HashMap::from([
            ("global".to_owned(), 41),
            ("daily-2026-08-01".to_owned(), 7),
            ("printer-lab-a".to_owned(), 3),
            ("template-asset-2026-08-01".to_owned(), 12),
        ]));
        let ctx = fixed_ctx()
            .with_printer_id("lab-a")
            .with_template_name("asset")
            .with_counters(&counters);
        let m = builtin_macros(&ctx);
        assert_eq!(m["_counter_global"], "41");
        assert_eq!(m["_counter_daily"], "7");
        assert_eq!(m["_counter_printer"], "3");
        assert_eq!(m["_counter_printer_daily"], "0");
        assert_eq!(m["_counter_template"], "0");
        assert_eq!(m["_counter_template_daily"], "12");
    }

    #[test]
    fn counters_without_source_resolve_to_zero() {
        let m = builtin_macros(&fixed_ctx());
        assert_eq!(m["_counter_global"], "0");
        assert_eq!(m["_counter_printer_daily"], "0");
    }

    #[test]
    fn scope_keys_embed_date_and_ids() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        assert_eq!(CounterScope::Global.key(), "global");
        assert_eq!(CounterScope::Daily { date }.key(), "daily-2026-08-01");
        assert_eq!(
            CounterScope::PrinterDaily {
                printer_id: "p1".into(),
                date
            }
            .key(),
            "printer-p1-2026-08-01"
        );
    }
}
