mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{ensure_static_server, get_with_cookie, location, unsigned_token};

#[tokio::test]
async fn anonymous_static_dashboard_redirects_to_signin() -> Result<()> {
    let server = ensure_static_server().await?;
    let res = get_with_cookie(server, "/dashboard/index.html", None).await?;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), Some("/signin"));
    Ok(())
}

#[tokio::test]
async fn alternate_spellings_of_a_gated_file_still_redirect() -> Result<()> {
    let server = ensure_static_server().await?;
    // The HTTP client collapses `/./` itself; the unit tests cover that form.
    for path in [
        "//dashboard/index.html",
        "/%64ashboard/index.html",
        "/dashboard//index.html",
        "/%2Fdashboard/index.html",
    ] {
        let res = get_with_cookie(server, path, None).await?;
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT, "{} was served without a credential", path);
        assert_eq!(location(&res), Some("/signin"), "{}", path);
    }
    Ok(())
}

#[tokio::test]
async fn agent_cannot_reach_dashboard_file_through_escapes() -> Result<()> {
    let server = ensure_static_server().await?;
    let token = unsigned_token(json!({"role": "agent"}));
    for path in ["/dashboard/index.html", "//dashboard/index.html", "/%64ashboard/index.html"] {
        let res = get_with_cookie(server, path, Some(&token)).await?;
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT, "{}", path);
        assert_eq!(location(&res), Some("/signin"), "{}", path);
    }
    Ok(())
}

#[tokio::test]
async fn agent_is_served_own_static_page() -> Result<()> {
    let server = ensure_static_server().await?;
    let token = unsigned_token(json!({"role": "agent"}));
    let res = get_with_cookie(server, "/agent/index.html", Some(&token)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await?, "<h1>agent page</h1>");
    Ok(())
}
