// ABOUTME: Extracts the prepaid credit balance from the portal's balance page HTML
// ABOUTME: Pluggable anchor strategies locate the element; the default is a fixed ordinal position
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # HTML Credit Extractor
//!
//! The portal renders labeled fields as a run of elements sharing one class and
//! publishes no stable ids. The only anchor observed to hold is the element's
//! position in that run, so [`AnchorStrategy::ByPosition`] is the default.
//! This is fragile against markup changes: when the portal layout drifts the
//! extractor reports [`ExtractError`] rather than guessing, and the anchor can
//! be switched through configuration (`CREDIT_ANCHOR`) without a rebuild.

use crate::constants::portal;
use crate::errors::ExtractError;
use crate::models::Balance;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use std::str::FromStr;

/// How the balance element is located in the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorStrategy {
    /// The `index`-th (zero-based) element matching `selector`
    ByPosition {
        /// CSS selector of the labeled-value elements
        selector: String,
        /// Zero-based position
        index: usize,
    },
    /// The first element matching `selector` whose text contains `label`
    /// (case-insensitive); if that element holds no amount, the element after it
    ByLabel {
        /// CSS selector of the labeled-value elements
        selector: String,
        /// Label text, e.g. `Balance`
        label: String,
    },
    /// The first element matching a dedicated selector
    BySelector {
        /// CSS selector of the balance element itself
        selector: String,
    },
}

impl Default for AnchorStrategy {
    fn default() -> Self {
        Self::ByPosition {
            selector: portal::CREDIT_ELEMENT_SELECTOR.to_owned(),
            index: portal::CREDIT_ELEMENT_INDEX,
        }
    }
}

impl fmt::Display for AnchorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByPosition { selector, index } => write!(f, "position {index} of `{selector}`"),
            Self::ByLabel { selector, label } => write!(f, "label `{label}` in `{selector}`"),
            Self::BySelector { selector } => write!(f, "selector `{selector}`"),
        }
    }
}

impl AnchorStrategy {
    /// Parse the compact form used in configuration.
    ///
    /// `position:<n>` and `label:<text>` apply to `element_selector`;
    /// `selector:<css>` names the balance element directly.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the form is not recognized
    pub fn parse(raw: &str, element_selector: &str) -> Result<Self, String> {
        let (kind, value) = raw
            .split_once(':')
            .map(|(kind, value)| (kind.trim(), value.trim()))
            .ok_or_else(|| {
                format!("`{raw}` should look like position:<n>, label:<text>, or selector:<css>")
            })?;
        if value.is_empty() {
            return Err(format!("`{raw}` has an empty value"));
        }

        match kind {
            "position" => value
                .parse()
                .map(|index| Self::ByPosition {
                    selector: element_selector.to_owned(),
                    index,
                })
                .map_err(|_| format!("`{value}` is not a position")),
            "label" => Ok(Self::ByLabel {
                selector: element_selector.to_owned(),
                label: value.to_owned(),
            }),
            "selector" => Ok(Self::BySelector {
                selector: value.to_owned(),
            }),
            other => Err(format!("unknown anchor kind `{other}`")),
        }
    }

    /// CSS selector this strategy queries
    #[must_use]
    pub fn selector(&self) -> &str {
        match self {
            Self::ByPosition { selector, .. }
            | Self::ByLabel { selector, .. }
            | Self::BySelector { selector } => selector,
        }
    }

    /// Check that the selector parses
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::InvalidSelector` when it does not
    pub fn validate(&self) -> Result<(), ExtractError> {
        compile(self.selector()).map(|_| ())
    }

    /// Text of the anchored element, untrimmed
    fn locate(&self, document: &Html) -> Result<String, ExtractError> {
        let selector = compile(self.selector())?;
        let mut elements = document.select(&selector);

        let text = match self {
            Self::ByPosition { index, .. } => elements.nth(*index).map(element_text),
            Self::BySelector { .. } => elements.next().map(element_text),
            Self::ByLabel { label, .. } => {
                let needle = label.to_lowercase();
                let texts: Vec<String> = elements.map(element_text).collect();
                texts
                    .iter()
                    .position(|text| text.to_lowercase().contains(&needle))
                    .and_then(|found| {
                        let labeled = &texts[found];
                        if labeled.contains(portal::CURRENCY_SYMBOL) {
                            Some(labeled.clone())
                        } else {
                            texts.get(found + 1).cloned()
                        }
                    })
            }
        };

        text.ok_or_else(|| ExtractError::AnchorNotFound {
            anchor: self.to_string(),
        })
    }
}

fn compile(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_owned(),
        reason: e.to_string(),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Turn the anchored element's text into a balance.
///
/// Text is trimmed, split on `$`, and the segment after the last `$` is trimmed
/// and parsed as a non-negative decimal.
///
/// # Errors
///
/// Returns `MissingCurrencySymbol`, `NotNumeric`, or `Negative`
pub fn parse_balance_text(text: &str) -> Result<Balance, ExtractError> {
    let text = text.trim();
    let segment = text
        .rsplit_once(portal::CURRENCY_SYMBOL)
        .map(|(_, amount)| amount.trim())
        .ok_or_else(|| ExtractError::MissingCurrencySymbol {
            text: text.to_owned(),
        })?;

    let amount = Decimal::from_str(segment).map_err(|_| ExtractError::NotNumeric {
        segment: segment.to_owned(),
    })?;

    Balance::new(amount).ok_or_else(|| ExtractError::Negative {
        value: amount.to_string(),
    })
}

/// Locates and parses the balance on the portal's balance page
#[derive(Debug, Clone, Default)]
pub struct CreditExtractor {
    anchor: AnchorStrategy,
}

impl CreditExtractor {
    /// Extractor using the given anchor strategy
    #[must_use]
    pub const fn new(anchor: AnchorStrategy) -> Self {
        Self { anchor }
    }

    /// The anchor strategy in use
    #[must_use]
    pub const fn anchor(&self) -> &AnchorStrategy {
        &self.anchor
    }

    /// Extract the balance from a page body
    ///
    /// # Errors
    ///
    /// Returns `ExtractError` when the anchor is absent or its text is not an amount
    pub fn extract(&self, html: &str) -> Result<Balance, ExtractError> {
        let document = Html::parse_document(html);
        let text = self.anchor.locate(&document)?;
        parse_balance_text(&text)
    }
}
