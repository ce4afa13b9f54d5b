//! Canonical component categories and the label normalizer.
//!
//! Column labels in the source tables are free text ("Persyaratan Pelayanan", "Biaya/Tarif",
//! ...). Each category owns a list of lower-case keywords; a label maps to the first category,
//! in declaration order, that has a keyword contained in the lower-cased label.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical sub-section of a record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Service requirements.
    Requirements,
    /// System, mechanism and procedure; the source of steps.
    Procedure,
    /// Processing time.
    ProcessingTime,
    /// Fee or tariff.
    Fee,
    /// Service product.
    Product,
    /// Complaint, suggestion and feedback handling.
    ComplaintHandling,
}

struct CategoryRule {
    category: Category,
    keywords: &'static [&'static str],
    label: &'static str,
}

const RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Requirements,
        keywords: &["persyaratan"],
        label: "Persyaratan Pelayanan",
    },
    CategoryRule {
        category: Category::Procedure,
        keywords: &["mekanisme", "prosedur", "sistem"],
        label: "Sistem, Mekanisme, dan Prosedur",
    },
    CategoryRule {
        category: Category::ProcessingTime,
        keywords: &["jangka waktu"],
        label: "Jangka Waktu Penyelesaian",
    },
    CategoryRule {
        category: Category::Fee,
        keywords: &["biaya", "tarif"],
        label: "Biaya/Tarif",
    },
    CategoryRule {
        category: Category::Product,
        keywords: &["produk layanan", "produk pelayanan", "produk"],
        label: "Produk Layanan",
    },
    CategoryRule {
        category: Category::ComplaintHandling,
        keywords: &["pengaduan", "keberatan", "saran", "masukan"],
        label: "Penanganan, Pengaduan, Saran dan Masukan",
    },
];

impl Category {
    /// Every category in declaration order.
    pub const ALL: [Category; 6] = [
        Category::Requirements,
        Category::Procedure,
        Category::ProcessingTime,
        Category::Fee,
        Category::Product,
        Category::ComplaintHandling,
    ];

    /// Stable machine name, also used as the chunk section label.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Requirements => "requirements",
            Category::Procedure => "procedure",
            Category::ProcessingTime => "processing-time",
            Category::Fee => "fee",
            Category::Product => "product",
            Category::ComplaintHandling => "complaint-handling",
        }
    }

    /// Human-readable label stored with each component.
    pub fn label(self) -> &'static str {
        rule(self).label
    }

    /// Keywords that select this category.
    pub fn keywords(self) -> &'static [&'static str] {
        rule(self).keywords
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn rule(category: Category) -> &'static CategoryRule {
    RULES
        .iter()
        .find(|rule| rule.category == category)
        .unwrap_or(&RULES[0])
}

/// Map a raw column label to its canonical category, or `None` when nothing matches.
pub fn normalize_label(label: &str) -> Option<Category> {
    let lowered = label.to_lowercase();
    if lowered.trim().is_empty() {
        return None;
    }
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|rule| rule.category)
}
