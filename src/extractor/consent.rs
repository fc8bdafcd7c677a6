use std::time::Duration;

use tokio::time::Instant;

use crate::browser::BrowserSession;
use crate::extractor::profile::ConsentRule;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Click the first button whose text contains one of `texts`, searching
/// the document and any same-origin iframes. Evaluates to `true` on click.
pub fn button_text_script(texts: &[&str]) -> String {
    let needles: Vec<String> = texts.iter().map(|t| t.to_lowercase()).collect();
    let needles = serde_json::to_string(&needles).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
  const needles = {needles};
  const docs = [document];
  for (const frame of document.querySelectorAll('iframe')) {{
    try {{ if (frame.contentDocument) docs.push(frame.contentDocument); }} catch (e) {{}}
  }}
  for (const doc of docs) {{
    for (const button of doc.querySelectorAll('button')) {{
      const text = (button.innerText || button.textContent || '').toLowerCase();
      const rect = button.getBoundingClientRect();
      if (rect.width > 0 && rect.height > 0 && needles.some(n => text.includes(n))) {{
        button.click();
        return true;
      }}
    }}
  }}
  return false;
}})()"#
    )
}

/// Best-effort dismissal of a cookie/consent prompt.
///
/// Polls until a button is clicked or `timeout` elapses. Never fails: a
/// page without a prompt just costs the timeout.
pub async fn dismiss(session: &dyn BrowserSession, rule: &ConsentRule, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    let script = (!rule.button_texts.is_empty()).then(|| button_text_script(&rule.button_texts));

    loop {
        for selector in &rule.selectors {
            for button in session.query(selector).await {
                if button.is_visible().await && button.click().await.is_ok() {
                    tracing::info!("Consent prompt dismissed ({})", selector);
                    return true;
                }
            }
        }

        if let Some(ref script) = script {
            match session.execute_script(script).await {
                Ok(serde_json::Value::Bool(true)) => {
                    tracing::info!("Consent prompt dismissed");
                    return true;
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Consent script failed: {}", e),
            }
        }

        if Instant::now() >= deadline {
            tracing::debug!("No consent prompt");
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeElement, FakePage, FakeSession};

    fn rule(selectors: Vec<&'static str>, texts: Vec<&'static str>) -> ConsentRule {
        ConsentRule {
            selectors,
            button_texts: texts,
            every_page: false,
        }
    }

    #[test]
    fn test_script_embeds_lowercased_texts() {
        let script = button_text_script(&["Yes, I Accept", "it's \"ok\""]);
        assert!(script.contains(r#"["yes, i accept","it's \"ok\""]"#));
        assert!(script.contains("iframe"));
    }

    #[tokio::test]
    async fn test_clicks_visible_selector_button() {
        let button = FakeElement::new();
        let session = FakeSession::new().page(
            "https://www.bbc.com/news",
            FakePage::new().with("button[aria-label='Consent']", button.clone()),
        );
        session.navigate("https://www.bbc.com/news").await.unwrap();

        let dismissed = dismiss(
            &session,
            &rule(vec!["button[aria-label='Consent']"], vec![]),
            Duration::ZERO,
        )
        .await;
        assert!(dismissed);
        assert_eq!(button.clicks(), 1);
    }

    #[tokio::test]
    async fn test_hidden_button_is_not_clicked() {
        let button = FakeElement::new().hidden();
        let session = FakeSession::new().page(
            "https://www.bbc.com/news",
            FakePage::new().with("button[aria-label='Consent']", button.clone()),
        );
        session.navigate("https://www.bbc.com/news").await.unwrap();

        let dismissed = dismiss(
            &session,
            &rule(vec!["button[aria-label='Consent']"], vec![]),
            Duration::ZERO,
        )
        .await;
        assert!(!dismissed);
        assert_eq!(button.clicks(), 0);
    }

    #[tokio::test]
    async fn test_text_search_through_script() {
        let session = FakeSession::new().page(
            "https://www.theguardian.com/international",
            FakePage::new().script("yes, i accept", serde_json::Value::Bool(true)),
        );
        session
            .navigate("https://www.theguardian.com/international")
            .await
            .unwrap();

        assert!(dismiss(&session, &rule(vec![], vec!["Yes, I accept"]), Duration::ZERO).await);
        assert_eq!(session.scripts().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_prompt_is_not_an_error() {
        let session = FakeSession::new().page("https://globalnews.ca/", FakePage::new());
        session.navigate("https://globalnews.ca/").await.unwrap();

        assert!(!dismiss(&session, &rule(vec!["#accept"], vec!["accept"]), Duration::ZERO).await);
    }
}
