//! Markup rendering
//!
//! Every function here is pure: the same input always yields byte-identical
//! output, so a card can be swapped for a re-rendered copy at any time.
//! Interaction is expressed through `data-action` attributes that the host
//! page dispatches on, never through inline script.

use std::fmt::Write;

use crate::domain::{DepartmentId, ProductRecord, QuantityError};

use super::patch::{CardNode, Markup};

/// Cards older than this many months without movement are highlighted
const STALE_MONTHS: u32 = 3;

/// Why the container shows no cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The server returned no products
    NothingFound,
    /// Products were found but none of them can be reserved any more
    AllReserved,
}

pub fn render_card(record: &ProductRecord) -> Markup {
    let mut html = String::with_capacity(1024);
    let id = record.id;

    // The card depends on the lock flag only. The department named in the
    // explanation is read from the context when the action fires.
    if record.is_locked() {
        let _ = write!(
            html,
            r#"<div class="product-card locked" data-product-id="{id}" data-action="explain-lock">"#
        );
        html.push_str(r#"<div class="lock-overlay">🔒</div>"#);
    } else {
        let _ = write!(
            html,
            r#"<div class="product-card" data-product-id="{id}" data-action="reserve">"#
        );
    }

    let (status_class, status_text) = if record.is_locked() {
        ("product-status locked", "🔒 Заблоковано")
    } else {
        ("product-status", "✅ Знайдено")
    };
    let _ = write!(
        html,
        r#"<div class="product-header"><span class="product-article">🆔 {}</span><span class="{status_class}">{status_text}</span></div>"#,
        escape_html(&record.article)
    );
    let _ = write!(
        html,
        r#"<div class="product-name">📝 {}</div>"#,
        escape_html(&record.name)
    );

    html.push_str(r#"<div class="product-details">"#);
    detail_row(&mut html, "🏮 Відділ:", "", &escape_html(record.department.as_str()));
    detail_row(
        &mut html,
        "📂 Група:",
        "",
        &escape_html(record.group.as_deref().unwrap_or("—")),
    );
    let months_class = if record.months_without_movement > STALE_MONTHS {
        "warning"
    } else {
        ""
    };
    detail_row(
        &mut html,
        "⌛ Без руху (міс):",
        months_class,
        &record.months_without_movement.to_string(),
    );
    detail_row(
        &mut html,
        "💰 Сума залишку:",
        "highlight",
        &format_money(record.balance_sum),
    );
    detail_row(
        &mut html,
        "📦 Доступно:",
        "success",
        &record.available.to_string(),
    );
    if record.has_user_reservation() {
        detail_row(
            &mut html,
            "🛍️ В резерві:",
            "warning",
            &format!(
                "{} ({})",
                record.user_reserved,
                format_money(record.user_reserved_sum)
            ),
        );
    }
    html.push_str("</div></div>");

    Markup::new(html)
}

fn detail_row(html: &mut String, label: &str, class: &str, value: &str) {
    let value_class = if class.is_empty() {
        String::from("product-detail-value")
    } else {
        format!("product-detail-value {class}")
    };
    let _ = write!(
        html,
        r#"<div class="product-detail-row"><span class="product-detail-label">{label}</span><span class="{value_class}">{value}</span></div>"#
    );
}

pub fn render_card_node(record: &ProductRecord) -> CardNode {
    CardNode {
        id: record.id,
        markup: render_card(record),
    }
}

/// Cards for every record that is still visible, in cache order
pub fn render_visible<'a>(records: impl IntoIterator<Item = &'a ProductRecord>) -> Vec<CardNode> {
    records
        .into_iter()
        .filter(|record| record.is_available())
        .map(render_card_node)
        .collect()
}

pub fn render_loader() -> Markup {
    Markup::new(r#"<div class="loader">🔍 Пошук...</div>"#)
}

pub fn render_empty_state(reason: EmptyReason) -> Markup {
    let text = match reason {
        EmptyReason::NothingFound => "Нічого не знайдено",
        EmptyReason::AllReserved => "Нічого не знайдено або все зарезервовано",
    };
    Markup::new(format!(
        r#"<div class="empty-state"><div class="empty-icon">🔍</div>{text}</div>"#
    ))
}

pub fn render_error_state() -> Markup {
    Markup::new(
        r#"<div class="empty-state error"><div class="empty-icon">❌</div>Помилка пошуку<button class="retry-btn" data-action="retry-search">🔄 Повторити</button></div>"#,
    )
}

pub fn render_sentinel(observer: u64) -> Markup {
    Markup::new(format!(
        r#"<div class="scroll-sentinel" data-observer="{observer}"></div>"#
    ))
}

pub fn render_list_badge(count: usize) -> Markup {
    if count == 0 {
        return Markup::default();
    }
    Markup::new(format!(r#"<span class="list-badge">{count}</span>"#))
}

pub fn render_department_info(department: Option<&DepartmentId>, count: usize) -> Markup {
    match department {
        Some(department) if count > 0 => Markup::new(format!(
            r#"<div class="department-info active">Відділ: <b>{}</b> · позицій: {count}</div>"#,
            escape_html(department.as_str())
        )),
        _ => Markup::default(),
    }
}

/// Explanation shown when a locked card is tapped
pub fn locked_alert_text(department: &DepartmentId) -> String {
    format!(
        "🔒 Цей товар з іншого відділу.\n\nПоточний список для відділу {department}.\nЗбережіть або очистіть список щоб почати новий."
    )
}

pub fn success_notice(message: &str) -> String {
    format!("✅ {message}")
}

pub fn failure_notice(message: &str) -> String {
    format!("❌ {message}")
}

pub fn load_more_failed_notice() -> String {
    String::from("⚠️ Не вдалося завантажити наступну сторінку. Прокрутіть ще раз, щоб повторити.")
}

pub fn quantity_error_notice(error: &QuantityError) -> String {
    match error {
        QuantityError::NotANumber | QuantityError::BelowMinimum => {
            String::from("❌ Введіть коректне число")
        }
        QuantityError::AboveAvailable { max } => format!("⚠️ Максимум: {max} шт."),
        QuantityError::NothingAvailable => String::from("⚠️ Товар уже зарезервовано повністю"),
    }
}

pub const CLEAR_LIST_PROMPT: &str = "Очистити весь список?";

pub const DELETE_ITEM_PROMPT: &str = "Видалити товар зі списку?";

pub const CHECKOUT_DONE_NOTICE: &str = "✅ Список збережено!";

pub fn format_money(amount: f64) -> String {
    format!("{amount:.2} грн")
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
