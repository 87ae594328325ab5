use crate::domain::ports::SumInWords;

/// Null converter: the spelled-out total is simply left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWords;

impl SumInWords for NoWords {
    fn spell(&self, _value: i64) -> Option<String> {
        None
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// German cardinal numbers, e.g. `1234` → `eintausendzweihundertvierunddreißig`.
#[cfg(feature = "words")]
#[derive(Debug, Clone, Copy, Default)]
pub struct GermanWords;

#[cfg(feature = "words")]
const ONES: [&str; 10] = [
    "", "ein", "zwei", "drei", "vier", "fünf", "sechs", "sieben", "acht", "neun",
];

#[cfg(feature = "words")]
const TEENS: [&str; 10] = [
    "zehn", "elf", "zwölf", "dreizehn", "vierzehn", "fünfzehn", "sechzehn", "siebzehn",
    "achtzehn", "neunzehn",
];

#[cfg(feature = "words")]
const TENS: [&str; 10] = [
    "", "", "zwanzig", "dreißig", "vierzig", "fünfzig", "sechzig", "siebzig", "achtzig",
    "neunzig",
];

#[cfg(feature = "words")]
const LIMIT: u64 = 1_000_000_000_000;

#[cfg(feature = "words")]
impl GermanWords {
    // 1..=99, "ein" form
    fn below_hundred(n: u64) -> String {
        let n = n as usize;
        match n {
            0 => String::new(),
            1..=9 => ONES[n].to_string(),
            10..=19 => TEENS[n - 10].to_string(),
            _ if n % 10 == 0 => TENS[n / 10].to_string(),
            _ => format!("{}und{}", ONES[n % 10], TENS[n / 10]),
        }
    }

    // 1..=999, "ein" form
    fn below_thousand(n: u64) -> String {
        let hundreds = n / 100;
        let mut words = String::new();
        if hundreds > 0 {
            words.push_str(ONES[hundreds as usize]);
            words.push_str("hundert");
        }
        words.push_str(&Self::below_hundred(n % 100));
        words
    }

    // Million and Milliarde are feminine nouns: "eine Million", "einhunderteine Millionen".
    fn large_unit(n: u64, singular: &str, plural: &str) -> String {
        if n == 1 {
            return format!("eine {}", singular);
        }
        let mut count = Self::below_thousand(n);
        if n % 100 == 1 {
            count.push('e');
        }
        format!("{} {}", count, plural)
    }

    fn spell_unsigned(n: u64) -> String {
        if n == 0 {
            return "null".to_string();
        }

        let milliarden = n / 1_000_000_000;
        let millionen = (n / 1_000_000) % 1000;
        let tausend = (n / 1000) % 1000;
        let rest = n % 1000;

        let mut parts = Vec::new();
        if milliarden > 0 {
            parts.push(Self::large_unit(milliarden, "Milliarde", "Milliarden"));
        }
        if millionen > 0 {
            parts.push(Self::large_unit(millionen, "Million", "Millionen"));
        }

        let mut small = String::new();
        if tausend > 0 {
            small.push_str(&Self::below_thousand(tausend));
            small.push_str("tausend");
        }
        if rest > 0 {
            small.push_str(&Self::below_thousand(rest));
            // a trailing standalone one is "eins"
            if rest % 100 == 1 {
                small.push('s');
            }
        }
        if !small.is_empty() {
            parts.push(small);
        }

        parts.join(" ")
    }
}

#[cfg(feature = "words")]
impl SumInWords for GermanWords {
    fn spell(&self, value: i64) -> Option<String> {
        let magnitude = value.unsigned_abs();
        if magnitude >= LIMIT {
            return None;
        }
        let words = Self::spell_unsigned(magnitude);
        if value < 0 {
            Some(format!("minus {}", words))
        } else {
            Some(words)
        }
    }
}

/// Picks the converter once at startup.
pub fn resolve_converter(enabled: bool, language: &str) -> Box<dyn SumInWords> {
    if !enabled {
        tracing::debug!("Spelled-out total disabled");
        return Box::new(NoWords);
    }

    match language.trim().to_ascii_lowercase().as_str() {
        #[cfg(feature = "words")]
        "de" => Box::new(GermanWords),
        other => {
            tracing::debug!(
                "No number-to-words converter available for language '{}'",
                other
            );
            Box::new(NoWords)
        }
    }
}

#[cfg(all(test, feature = "words"))]
mod tests {
    use super::*;

    fn spell(n: i64) -> String {
        GermanWords.spell(n).unwrap()
    }

    #[test]
    fn test_small_numbers() {
        assert_eq!(spell(0), "null");
        assert_eq!(spell(1), "eins");
        assert_eq!(spell(7), "sieben");
        assert_eq!(spell(11), "elf");
        assert_eq!(spell(16), "sechzehn");
        assert_eq!(spell(17), "siebzehn");
        assert_eq!(spell(21), "einundzwanzig");
        assert_eq!(spell(30), "dreißig");
        assert_eq!(spell(70), "siebzig");
        assert_eq!(spell(99), "neunundneunzig");
    }

    #[test]
    fn test_hundreds_and_thousands() {
        assert_eq!(spell(100), "einhundert");
        assert_eq!(spell(101), "einhunderteins");
        assert_eq!(spell(215), "zweihundertfünfzehn");
        assert_eq!(spell(1000), "eintausend");
        assert_eq!(spell(1001), "eintausendeins");
        assert_eq!(spell(1234), "eintausendzweihundertvierunddreißig");
        assert_eq!(spell(21_000), "einundzwanzigtausend");
        assert_eq!(spell(999_999), "neunhundertneunundneunzigtausendneunhundertneunundneunzig");
    }

    #[test]
    fn test_millions_and_billions() {
        assert_eq!(spell(1_000_000), "eine Million");
        assert_eq!(spell(1_000_001), "eine Million eins");
        assert_eq!(spell(2_500_000), "zwei Millionen fünfhunderttausend");
        assert_eq!(spell(101_000_000), "einhunderteine Millionen");
        assert_eq!(spell(1_000_000_000), "eine Milliarde");
        assert_eq!(spell(3_000_020_000), "drei Milliarden zwanzigtausend");
    }

    #[test]
    fn test_negative_and_out_of_range() {
        assert_eq!(spell(-5), "minus fünf");
        assert!(GermanWords.spell(1_000_000_000_000).is_none());
        assert!(GermanWords.spell(i64::MIN).is_none());
    }

    #[test]
    fn test_resolve_converter() {
        assert!(resolve_converter(true, "de").is_available());
        assert!(resolve_converter(true, " DE ").is_available());
        assert!(!resolve_converter(false, "de").is_available());
        assert!(!resolve_converter(true, "fr").is_available());
        assert!(NoWords.spell(42).is_none());
    }
}
