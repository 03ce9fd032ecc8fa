//! Daily email of products about to expire.

use std::sync::Arc;

use crate::config::{DIGEST_EXPIRY_DAYS, DIGEST_REFRESH_DAYS};
use crate::domain::Product;
use crate::errors::AppResult;
use crate::infra::{EmailMessage, Mailer, UserRepository};
use crate::services::InventoryService;

pub const DIGEST_SUBJECT: &str = "Items with major discounts, expiring in 1 day!";
pub const DIGEST_FOOTER: &str = "© 2025 Green Campus Initiative. Empowering Sustainable Change.";

/// What a digest run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestOutcome {
    NoRecipients,
    NoProducts,
    Sent { recipients: usize, products: usize, failed: usize },
}

/// Reprices soon-to-expire stock and mails it to every user.
pub struct DiscountDigest {
    inventory: Arc<dyn InventoryService>,
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn Mailer>,
}

impl DiscountDigest {
    pub fn new(
        inventory: Arc<dyn InventoryService>,
        users: Arc<dyn UserRepository>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            inventory,
            users,
            mailer,
        }
    }

    pub async fn run(&self) -> AppResult<DigestOutcome> {
        let recipients: Vec<String> = self
            .users
            .emails()
            .await?
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        if recipients.is_empty() {
            tracing::info!("No recipients found, discount digest not sent");
            return Ok(DigestOutcome::NoRecipients);
        }

        self.inventory.refresh_discounts(DIGEST_REFRESH_DAYS).await?;
        let products = self.inventory.refresh_discounts(DIGEST_EXPIRY_DAYS).await?;
        if products.is_empty() {
            tracing::info!("No expiring products, discount digest not sent");
            return Ok(DigestOutcome::NoProducts);
        }

        let text = plain_text_table(&products);
        let html = html_table(&products);

        // One message per address.
        let mut failed = 0;
        for to in &recipients {
            let message = EmailMessage::text(to.as_str(), DIGEST_SUBJECT, text.as_str())
                .with_html(html.as_str());
            if let Err(e) = self.mailer.send(message).await {
                failed += 1;
                tracing::error!(to = %to, error = %e, "Failed to send discount digest");
            }
        }

        tracing::info!(
            recipients = recipients.len(),
            products = products.len(),
            failed,
            "Discount digest sent"
        );
        Ok(DigestOutcome::Sent {
            recipients: recipients.len(),
            products: products.len(),
            failed,
        })
    }
}

pub fn plain_text_table(products: &[Product]) -> String {
    let mut lines = vec![
        "Name | Expiry | Units | Marked Price | Final Price | Location".to_string(),
        "-".repeat(60),
    ];
    lines.extend(products.iter().map(|p| {
        format!(
            "{} | {} | {} | £{:.2} | £{:.2} | {}",
            p.name,
            p.expiry_date.format("%Y-%m-%d"),
            p.units,
            p.marked_price,
            p.final_price,
            p.location
        )
    }));
    lines.push(format!("\n{}", DIGEST_FOOTER));
    lines.join("\n")
}

pub fn html_table(products: &[Product]) -> String {
    let rows: String = products
        .iter()
        .map(|p| {
            format!(
                r#"
        <tr>
            <td>{}</td>
            <td>{}</td>
            <td>{}</td>
            <td>£{:.2}</td>
            <td>£{:.2}</td>
            <td>{}</td>
        </tr>"#,
                escape_html(&p.name),
                p.expiry_date.format("%Y-%m-%d"),
                p.units,
                p.marked_price,
                p.final_price,
                escape_html(&p.location)
            )
        })
        .collect();

    format!(
        r#"
<div style="background-color: #f4fcf7; padding: 20px;">
    <h2 style="text-align: center;">{subject}</h2>
    <p style="text-align: center;">Here are our products with exciting offers which expire soon:</p>
    <table border="1" cellspacing="0" cellpadding="4" style="margin: 0 auto;">
        <tr>
            <th>Product</th>
            <th>Expiry Date</th>
            <th>Units</th>
            <th>Marked Price</th>
            <th>Final Price</th>
            <th>Location</th>
        </tr>{rows}
    </table>
    <br><hr>
    <p style="font-size: 0.9em; color: gray; text-align: center;">
        {footer}
    </p>
</div>
"#,
        subject = DIGEST_SUBJECT,
        rows = rows,
        footer = DIGEST_FOOTER
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
