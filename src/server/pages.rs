//! 页面：订单表单和嵌入页

/// 订单表单页面
pub const ORDER_FORM_HTML: &str = include_str!("../../static/order_form.html");

const COMPANY_NAME: &str = "Technology Solutions, Inc.";

/// 嵌入页：在 iframe 中打开分享链接，没有链接时显示 Loading...
pub fn embed_page(url: Option<&str>) -> String {
    let body = match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => format!(
            r#"<iframe src="{}" style="border: none; width: 100%; height: 100%; overflow: hidden" title="Embedded Docx"></iframe>"#,
            escape_html(url)
        ),
        None => "<p>Loading...</p>".to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{company}</title>
<style>
  body {{ margin: 0; font-family: sans-serif; }}
  header {{ background: #2563eb; padding: 1.25rem; }}
  header h1 {{ margin: 0; color: #fff; font-size: 1.5rem; }}
</style>
</head>
<body>
<div style="width: 100%; height: 100vh">
<header><h1>{company}</h1></header>
{body}
</div>
</body>
</html>
"#,
        company = COMPANY_NAME,
        body = body
    )
}

/// HTML 属性转义
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_page_escapes_url() {
        let page = embed_page(Some(r#"https://x.test/a?b=1&c="><script>"#));
        assert!(page.contains(r#"src="https://x.test/a?b=1&amp;c=&quot;&gt;&lt;script&gt;""#));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_embed_page_without_url() {
        let page = embed_page(None);
        assert!(page.contains("Loading..."));
        assert!(!page.contains("<iframe"));
        assert!(embed_page(Some("")).contains("Loading..."));
    }

    #[test]
    fn test_order_form_posts_to_api() {
        assert!(ORDER_FORM_HTML.contains("/api/createPurchaseOrder"));
        assert!(ORDER_FORM_HTML.contains("/api/resetFlow"));
    }
}
