//! Quote pricing.
//!
//! Totals are rounded to cents with round-half-to-even (banker's rounding),
//! everywhere and always through [`compute_total`].

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::models::{Quote, QuoteStatus, Rate, TranslationRequest};
use crate::DomainError;

/// Unit price used when no rate exists for a language pair: 0.10.
pub const FALLBACK_UNIT_PRICE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

pub const DEFAULT_CURRENCY: &str = "EUR";

/// Inputs for one pricing run.
#[derive(Debug, Clone, Default)]
pub struct PriceInput {
    pub word_count: i32,
    /// Manager correction; wins over the rate table.
    pub override_unit_price: Option<Decimal>,
    pub currency: Option<String>,
}

/// Override first, then the rate, then the fallback.
pub fn resolve_unit_price(rate: Option<&Rate>, override_unit_price: Option<Decimal>) -> Decimal {
    override_unit_price
        .or_else(|| rate.map(|r| r.unit_price))
        .unwrap_or(FALLBACK_UNIT_PRICE)
}

pub fn compute_total(word_count: i32, unit_price: Decimal) -> Decimal {
    (Decimal::from(word_count) * unit_price)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Prices a request.
///
/// An existing quote is updated in place and keeps its status; otherwise a new
/// Draft quote is built. The request's word count follows the quote's.
pub fn price(
    request: &mut TranslationRequest,
    existing: Option<Quote>,
    rate: Option<&Rate>,
    input: PriceInput,
    now: DateTime<Utc>,
) -> Result<Quote, DomainError> {
    if input.word_count < 0 {
        return Err(DomainError::validation("Word count can not be negative"));
    }
    if matches!(input.override_unit_price, Some(p) if p.is_sign_negative()) {
        return Err(DomainError::validation("Unit price can not be negative"));
    }

    let unit_price = resolve_unit_price(rate, input.override_unit_price);
    let total = compute_total(input.word_count, unit_price);

    let quote = match existing {
        Some(mut quote) => {
            if !quote.status.is_repriceable() {
                return Err(DomainError::conflict(format!(
                    "Quote is {} and can no longer be repriced",
                    quote.status
                )));
            }
            if let Some(currency) = input.currency {
                quote.currency = currency;
            }
            quote.word_count = input.word_count;
            quote.unit_price = unit_price;
            quote.total = total;
            quote.updated_at = now;
            quote
        }
        None => Quote {
            id: Uuid::new_v4(),
            request_id: request.id,
            word_count: input.word_count,
            unit_price,
            currency: input
                .currency
                .or_else(|| rate.map(|r| r.currency.clone()))
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            total,
            status: QuoteStatus::Draft,
            created_at: now,
            updated_at: now,
        },
    };

    request.word_count = quote.word_count;
    Ok(quote)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TranslationRequest {
        TranslationRequest {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            source_language: "en".into(),
            target_language: "it".into(),
            original_filename: "brochure.txt".into(),
            translated_filename: None,
            word_count: 0,
            source_text: String::new(),
            extraction_error: None,
            created_at: Utc::now(),
        }
    }

    fn rate(unit_price: Decimal) -> Rate {
        Rate {
            id: Uuid::new_v4(),
            source_language: "en".into(),
            target_language: "it".into(),
            unit_price,
            currency: "EUR".into(),
        }
    }

    fn input(word_count: i32) -> PriceInput {
        PriceInput {
            word_count,
            ..Default::default()
        }
    }

    #[test]
    fn test_rate_pricing_creates_draft() {
        let mut request = request();
        let quote = price(
            &mut request,
            None,
            Some(&rate(Decimal::new(10, 2))),
            input(1000),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(quote.status, QuoteStatus::Draft);
        assert_eq!(quote.total, Decimal::new(10000, 2));
        assert_eq!(quote.total.to_string(), "100.00");
        assert_eq!(quote.request_id, request.id);
        assert_eq!(request.word_count, 1000);
    }

    #[test]
    fn test_fallback_price_without_rate() {
        let mut request = request();
        let quote = price(&mut request, None, None, input(250), Utc::now()).unwrap();

        assert_eq!(quote.unit_price, FALLBACK_UNIT_PRICE);
        assert_eq!(quote.total, Decimal::new(2500, 2));
        assert_eq!(quote.currency, DEFAULT_CURRENCY);
    }

    #[test]
    fn test_override_beats_rate() {
        let mut request = request();
        let quote = price(
            &mut request,
            None,
            Some(&rate(Decimal::new(10, 2))),
            PriceInput {
                word_count: 100,
                override_unit_price: Some(Decimal::new(15, 2)),
                currency: None,
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(quote.unit_price, Decimal::new(15, 2));
        assert_eq!(quote.total, Decimal::new(1500, 2));
    }

    #[test]
    fn test_reprice_keeps_status_and_id() {
        let mut request = request();
        let mut quote = price(&mut request, None, None, input(100), Utc::now()).unwrap();
        quote.set_status(QuoteStatus::Sent);
        let id = quote.id;

        let repriced = price(
            &mut request,
            Some(quote),
            None,
            PriceInput {
                word_count: 120,
                override_unit_price: Some(Decimal::new(12, 2)),
                currency: Some("USD".into()),
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(repriced.id, id);
        assert_eq!(repriced.status, QuoteStatus::Sent);
        assert_eq!(repriced.total, Decimal::new(1440, 2));
        assert_eq!(repriced.currency, "USD");
        assert_eq!(request.word_count, 120);
    }

    #[test]
    fn test_answered_quote_can_not_be_repriced() {
        let mut request = request();
        let mut quote = price(&mut request, None, None, input(100), Utc::now()).unwrap();
        quote.set_status(QuoteStatus::Approved);

        let result = price(&mut request, Some(quote), None, input(10), Utc::now());
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[test]
    fn test_total_uses_half_even_rounding() {
        // 1 * 0.125 -> 0.12, 1 * 0.135 -> 0.14
        assert_eq!(compute_total(1, Decimal::new(125, 3)), Decimal::new(12, 2));
        assert_eq!(compute_total(1, Decimal::new(135, 3)), Decimal::new(14, 2));
        assert_eq!(compute_total(3, Decimal::new(3333, 4)), Decimal::new(100, 2));
    }

    #[test]
    fn test_total_invariant_holds_for_many_inputs() {
        let mut request = request();
        for (words, cents) in [(0, 10), (1, 7), (999, 13), (12345, 9), (7, 1234)] {
            let unit_price = Decimal::new(cents, 3);
            let quote = price(
                &mut request,
                None,
                None,
                PriceInput {
                    word_count: words,
                    override_unit_price: Some(unit_price),
                    currency: None,
                },
                Utc::now(),
            )
            .unwrap();
            assert_eq!(quote.total, compute_total(quote.word_count, quote.unit_price));
            assert!(quote.total.scale() <= 2);
        }
    }

    #[test]
    fn test_negative_inputs_rejected() {
        let mut request = request();
        assert!(price(&mut request, None, None, input(-1), Utc::now()).is_err());
        assert!(price(
            &mut request,
            None,
            None,
            PriceInput {
                word_count: 1,
                override_unit_price: Some(Decimal::new(-1, 2)),
                currency: None,
            },
            Utc::now()
        )
        .is_err());
    }
}
