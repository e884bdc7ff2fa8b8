//! Text report builder for CLI and TUI output.
//!
//! Reads well-known paths out of the opaque scan payload. Missing scalar
//! fields print as `N/A`; missing optional sections are skipped.

use crate::model::CompletedScan;
use serde_json::Value;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Render a JSON scalar the way the web client interpolates it.
fn text(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => "N/A".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

fn flag(v: Option<&Value>) -> bool {
    v.and_then(Value::as_bool).unwrap_or(false)
}

fn yes_no(v: Option<&Value>, yes: &str, no: &str) -> String {
    let s = if flag(v) { yes } else { no };
    s.to_string()
}

fn strings(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|a| a.iter().map(|x| text(Some(x))).collect())
        .unwrap_or_default()
}

/// Website, X and Telegram links, in that order.
pub(crate) fn social_links(metadata: Option<&Value>) -> Vec<(&'static str, String)> {
    let Some(meta) = metadata else {
        return Vec::new();
    };
    [("Website", "website"), ("X", "twitter"), ("Telegram", "telegram")]
        .into_iter()
        .filter_map(|(label, key)| {
            meta.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(|s| (label, s.to_string()))
        })
        .collect()
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(title.to_string());
}

fn item(lines: &mut Vec<String>, label: &str, value: String) {
    lines.push(format!("  {label:<24} {value}"));
}

/// Build a text report from a completed scan.
pub(crate) fn build_text_summary(scan: &CompletedScan) -> TextSummary {
    let d = scan.result.raw();
    let at = |p: &str| d.pointer(p);
    let mut lines = Vec::new();

    lines.push(
        scan.result
            .token_label()
            .unwrap_or_else(|| "N/A (N/A)".to_string()),
    );
    let links = social_links(d.get("metadata"));
    if links.is_empty() {
        lines.push("No social links found".to_string());
    } else {
        for (label, url) in links {
            lines.push(format!("{label}: {url}"));
        }
    }
    let contract = d
        .get("mint_address")
        .and_then(Value::as_str)
        .unwrap_or(scan.address.as_str());
    lines.push(format!("Contract: {contract}"));
    lines.push(format!("[T] Token Age: {}", text(at("/token_info/age"))));

    if let Some(auth) = at("/detailed_analysis/authority_analysis") {
        section(&mut lines, "[#] Token Security Status (CRITICAL)");
        item(
            &mut lines,
            "Mint Authority:",
            yes_no(auth.get("mint_authority_renounced"), "[OK] RENOUNCED", "[X] NOT RENOUNCED"),
        );
        item(
            &mut lines,
            "Freeze Authority:",
            yes_no(auth.get("freeze_authority_renounced"), "[OK] RENOUNCED", "[X] NOT RENOUNCED"),
        );
    }

    section(&mut lines, "[!] Safety Score");
    item(
        &mut lines,
        "Score:",
        format!("{}/100", text(at("/risk_assessment/overall_score"))),
    );
    item(&mut lines, "Level:", text(at("/risk_assessment/risk_level")));
    if let Some(verdict) = at("/risk_assessment/verdict") {
        lines.push(format!("  {}", text(Some(verdict))));
    }

    if flag(at("/ml_prediction/enabled")) {
        section(&mut lines, "[AI] ML Prediction");
        item(
            &mut lines,
            "AI Score:",
            format!("{}/100", text(at("/ml_prediction/score"))),
        );
        if let Some(c) = at("/ml_prediction/confidence").and_then(Value::as_f64) {
            item(&mut lines, "Confidence:", format!("{c:.1}%"));
        }
        if let Some(probs) = at("/ml_prediction/probabilities").and_then(Value::as_object) {
            for (class, p) in probs {
                let pct = p.as_f64().unwrap_or(0.0);
                item(&mut lines, &format!("{class}:"), format!("{pct:.1}%"));
            }
        }
    }

    if let Some(conf) = at("/risk_assessment/confidence").filter(|v| !v.is_null()) {
        section(&mut lines, "[i] Analysis Confidence");
        item(&mut lines, "Level:", text(conf.get("level")));
        item(&mut lines, "Score:", format!("{}/100", text(conf.get("score"))));
        for factor in strings(conf.get("factors")) {
            lines.push(format!("  - {factor}"));
        }
    }

    section(&mut lines, "[$] Market Data");
    item(&mut lines, "Market Cap:", text(at("/market_data/market_cap")));
    item(&mut lines, "Liquidity:", text(at("/market_data/liquidity")));
    item(&mut lines, "Price:", text(at("/market_data/price")));
    item(&mut lines, "24h Volume:", text(at("/market_data/volume_24h")));

    section(&mut lines, "[*] Holder Stats");
    item(&mut lines, "Total Holders:", text(at("/holder_stats/total_holders")));
    item(
        &mut lines,
        "Top Holder:",
        text(at("/holder_stats/top_holder_percentage")),
    );
    item(&mut lines, "Top 10:", text(at("/holder_stats/top_10_percentage")));
    item(
        &mut lines,
        "Fresh Wallets (Top 10):",
        text(at("/holder_stats/fresh_wallets_top10")),
    );

    let score = |key: &str| {
        let path = format!("/risk_assessment/component_scores/{key}");
        format!("{}/100", text(at(&path)))
    };
    section(&mut lines, "[=] Component Scores");
    item(&mut lines, "Liquidity:", score("liquidity"));
    item(&mut lines, "Creator History:", score("creator_history"));
    item(&mut lines, "Social Presence:", score("social_presence"));
    item(&mut lines, "Wallet Analysis:", score("wallet_analysis"));

    section(&mut lines, "[>] Detection Results");
    item(&mut lines, "Sniper Detection:", score("sniper_detection"));
    item(&mut lines, "Volume Analysis:", score("volume_analysis"));
    item(&mut lines, "Pump & Dump:", score("pump_dump"));
    item(&mut lines, "Distribution:", score("distribution"));

    if let Some(detail) = d.get("detailed_analysis").filter(|v| !v.is_null()) {
        let at = |p: &str| detail.pointer(p);
        section(&mut lines, "[^] Sniper Analysis");
        item(
            &mut lines,
            "Instant Snipers (3s):",
            format!(
                "{} txs ({})",
                text(at("/sniper_analysis/instant_snipers")),
                text(at("/sniper_analysis/instant_sniper_percentage"))
            ),
        );
        item(
            &mut lines,
            "Total Snipers (10s):",
            format!(
                "{} txs ({})",
                text(at("/sniper_analysis/total_snipers")),
                text(at("/sniper_analysis/sniper_percentage"))
            ),
        );
        item(
            &mut lines,
            "Coordinated Buying:",
            yes_no(at("/sniper_analysis/coordinated_buying"), "[!] YES", "NO"),
        );

        section(&mut lines, "[=] Volume Analysis");
        item(
            &mut lines,
            "Wash Trading:",
            yes_no(at("/volume_analysis/is_wash_trading"), "[!] DETECTED", "NO"),
        );
        item(
            &mut lines,
            "Fake Volume:",
            yes_no(at("/volume_analysis/is_fake_volume"), "[!] DETECTED", "NO"),
        );
        item(
            &mut lines,
            "Vol/MCap Ratio:",
            text(at("/volume_analysis/volume_to_mcap_ratio")),
        );
        item(
            &mut lines,
            "Buy Volume %:",
            text(at("/volume_analysis/buy_volume_percentage")),
        );

        section(&mut lines, "[~] Pump & Dump");
        item(
            &mut lines,
            "Pattern Detected:",
            yes_no(at("/pump_dump_analysis/is_pump_dump"), "[!] YES", "NO"),
        );
        item(
            &mut lines,
            "Volatility:",
            text(at("/pump_dump_analysis/price_volatility")),
        );
        item(
            &mut lines,
            "Max Spike:",
            text(at("/pump_dump_analysis/max_price_spike")),
        );
        if let Some(pattern) = at("/pump_dump_analysis/pattern_type").and_then(Value::as_str) {
            item(&mut lines, "Pattern Type:", pattern.to_string());
        }
    }

    let red_flags = strings(d.get("red_flags"));
    if !red_flags.is_empty() {
        section(&mut lines, "[X] Red Flags");
        lines.extend(red_flags.into_iter().map(|f| format!("  - {f}")));
    }
    let recommendations = strings(d.get("recommendations"));
    if !recommendations.is_empty() {
        section(&mut lines, "[>] Recommendations");
        lines.extend(recommendations.into_iter().map(|r| format!("  - {r}")));
    }

    section(&mut lines, "[T] Scan");
    item(&mut lines, "Scanned at:", scan.scanned_at_utc.clone());
    item(
        &mut lines,
        "Elapsed:",
        format!("{:.1}s", scan.elapsed_ms as f64 / 1000.0),
    );

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScanResult;
    use serde_json::json;

    fn scan(payload: Value) -> CompletedScan {
        CompletedScan {
            address: "11111111111111111111111111111111".into(),
            scanned_at_utc: "2026-10-17T12:00:00Z".into(),
            elapsed_ms: 23_400,
            result: ScanResult::new(payload),
        }
    }

    fn has(summary: &TextSummary, needle: &str) -> bool {
        summary.lines.iter().any(|l| l.contains(needle))
    }

    #[test]
    fn minimal_payload_renders_with_placeholders() {
        let s = build_text_summary(&scan(json!({
            "risk_assessment": {"overall_score": 12, "risk_level": "DANGER"}
        })));
        assert_eq!(s.lines[0], "N/A (N/A)");
        assert!(has(&s, "No social links found"));
        assert!(has(&s, "Contract: 11111111111111111111111111111111"));
        assert!(has(&s, "12/100"));
        assert!(has(&s, "DANGER"));
        assert!(!has(&s, "Sniper Analysis"));
        assert!(!has(&s, "ML Prediction"));
        assert!(has(&s, "23.4s"));
    }

    #[test]
    fn full_payload_renders_sections() {
        let s = build_text_summary(&scan(json!({
            "mint_address": "So11111111111111111111111111111111111111112",
            "token_info": {"name": "Bonk", "symbol": "BONK", "age": "3 days 2 hours"},
            "metadata": {"website": "https://bonk.example", "twitter": "", "telegram": "https://t.me/bonk"},
            "risk_assessment": {
                "overall_score": 74, "risk_level": "SAFE",
                "verdict": "[OK] SAFE - Low risk detected.",
                "component_scores": {"liquidity": 80, "pump_dump": 10},
                "confidence": {"level": "HIGH", "score": 85, "factors": ["Token older than 24h"]}
            },
            "ml_prediction": {"enabled": true, "score": 66, "confidence": 91.25,
                              "probabilities": {"safe": 0.0}},
            "detailed_analysis": {
                "authority_analysis": {"mint_authority_renounced": true, "freeze_authority_renounced": false},
                "sniper_analysis": {"instant_snipers": 2, "instant_sniper_percentage": "1.5%"},
                "pump_dump_analysis": {"is_pump_dump": true, "pattern_type": "stairs"}
            },
            "red_flags": ["Top holder owns 35%"],
            "recommendations": []
        })));
        assert_eq!(s.lines[0], "Bonk (BONK)");
        assert_eq!(s.lines[1], "Website: https://bonk.example");
        assert_eq!(s.lines[2], "Telegram: https://t.me/bonk");
        assert!(has(&s, "Contract: So11111111111111111111111111111111111111112"));
        assert!(has(&s, "[T] Token Age: 3 days 2 hours"));
        assert!(has(&s, "[OK] RENOUNCED"));
        assert!(has(&s, "[X] NOT RENOUNCED"));
        assert!(has(&s, "91.2%") || has(&s, "91.3%"));
        assert!(has(&s, "- Token older than 24h"));
        assert!(has(&s, "2 txs (1.5%)"));
        assert!(has(&s, "stairs"));
        assert!(has(&s, "- Top holder owns 35%"));
        assert!(!has(&s, "Recommendations"));
    }

    #[test]
    fn social_links_keep_order_and_skip_empty() {
        let meta = json!({"telegram": "t", "twitter": "x", "website": null});
        let links = social_links(Some(&meta));
        assert_eq!(
            links,
            vec![("X", "x".to_string()), ("Telegram", "t".to_string())]
        );
        assert!(social_links(None).is_empty());
    }
}
