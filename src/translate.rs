//! Glossary-based English to Chinese substitution for deal text.
//!
//! This is a word-substitution pass, not machine translation. Results are
//! memoised in a cache owned by the translator instance.

use std::collections::HashMap;

use crate::models::ResolvedDeal;

/// Substitutions, applied in order to the lowercased text.
const GLOSSARY: &[(&str, &str)] = &[
    ("free", "免费"),
    ("deal", "优惠"),
    ("offer", "优惠"),
    ("discount", "折扣"),
    ("save", "省钱"),
    ("sale", "促销"),
    ("voucher", "优惠券"),
    ("code", "代码"),
    ("cashback", "返现"),
    ("student", "学生"),
    ("new", "新"),
    ("exclusive", "独家"),
    ("limited", "限时"),
    ("today", "今天"),
    ("now", "现在"),
    ("get", "获得"),
    ("buy", "购买"),
    ("shop", "购物"),
    ("online", "在线"),
    ("delivery", "配送"),
    ("shipping", "运费"),
    ("click", "点击"),
    ("here", "这里"),
    ("link", "链接"),
    ("visit", "访问"),
    ("website", "网站"),
    ("store", "商店"),
    ("price", "价格"),
    ("cheap", "便宜"),
    ("bargain", "便宜货"),
    ("member", "会员"),
    ("signup", "注册"),
    ("register", "注册"),
    ("account", "账户"),
];

/// Memoising glossary translator.
#[derive(Debug, Default)]
pub struct GlossaryTranslator {
    cache: HashMap<String, String>,
}

impl GlossaryTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoised inputs.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn translate(&mut self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        if let Some(hit) = self.cache.get(text) {
            return hit.clone();
        }

        let translated = GLOSSARY
            .iter()
            .fold(text.to_lowercase(), |acc, &(en, zh)| acc.replace(en, zh));
        let result = preserve_case(text, translated);

        self.cache.insert(text.to_string(), result.clone());
        result
    }

    /// Copy of `deal` with translated title and description attached.
    pub fn translate_deal(&mut self, deal: &ResolvedDeal) -> ResolvedDeal {
        let title = self.translate(&deal.title);
        let description = self.translate(&deal.description);
        deal.with_translation(title, description)
    }
}

/// Re-apply the casing shape of `original` to `translated`.
fn preserve_case(original: &str, translated: String) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return translated;
    }
    if letters.iter().all(|c| c.is_uppercase()) {
        return translated.to_uppercase();
    }
    if is_title_case(original) {
        return title_case(&translated);
    }
    translated
}

/// Every word starts uppercase and continues lowercase.
fn is_title_case(text: &str) -> bool {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .all(|word| {
            let mut chars = word.chars();
            chars.next().is_some_and(char::is_uppercase) && chars.all(char::is_lowercase)
        })
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
