// Colored terminal output for stage reports, topics and insights.

use colored::Colorize;

use super::truncate_chars;
use crate::insights::Insights;
use crate::models::{TopicSummary, OUTLIER_TOPIC};
use crate::pipeline::StageReport;

/// Print one line per finished stage.
pub fn display_reports(reports: &[StageReport]) {
    for report in reports {
        let groups = match (report.stage.name(), report.groups) {
            ("cluster", Some(n)) => format!(", {n} clusters"),
            (_, Some(n)) => format!(", {n} topics"),
            (_, None) => String::new(),
        };
        println!(
            "  {} {:<8} {} documents{}",
            "ok".green(),
            report.stage.name().bold(),
            report.documents,
            groups
        );
    }
}

/// Print the topic table from topic_info.json.
pub fn display_topics(summaries: &[TopicSummary]) {
    if summaries.is_empty() {
        println!("No topics yet. Run `transit-insight topics` first.");
        return;
    }

    let topics = summaries.iter().filter(|s| s.topic != OUTLIER_TOPIC).count();
    println!("\n{}", format!("=== Topics ({topics}) ===").bold());
    println!();

    for summary in summaries {
        let label = if summary.topic == OUTLIER_TOPIC {
            "outliers".dimmed()
        } else {
            format!("topic {}", summary.topic).cyan()
        };
        let keywords = summary
            .keywords_translated
            .as_ref()
            .unwrap_or(&summary.keywords)
            .join(", ");
        println!("  {:<12} {:>5} docs  {}", label, summary.size, keywords);
        if let Some(example) = &summary.representative {
            println!("  {:<12} {}", "", truncate_chars(example, 90).dimmed());
        }
    }
    println!();
}

/// Print the dashboard view.
pub fn display_insights(insights: &Insights) {
    println!(
        "\n{}",
        format!("=== Insights ({} messages) ===", insights.total_messages).bold()
    );

    if let Some(mean) = insights.mean_sentiment {
        println!("  Mean sentiment: {}", colorize_score(mean));
    }
    let languages: Vec<String> = insights
        .languages
        .iter()
        .map(|(lang, n)| format!("{lang}={n}"))
        .collect();
    println!("  Languages: {}", languages.join(" "));
    println!();

    println!(
        "  {:<10} {:>6} {:>6} {:>7}  {}",
        "Topic".dimmed(),
        "Total".dimmed(),
        "% de".dimmed(),
        "Sent.".dimmed(),
        "Keywords".dimmed(),
    );
    println!("  {}", "-".repeat(72).dimmed());
    for topic in &insights.topics {
        let label = match topic.topic {
            Some(OUTLIER_TOPIC) => "outliers".to_string(),
            Some(t) => t.to_string(),
            None => "-".to_string(),
        };
        println!(
            "  {:<10} {:>6} {:>5.1}% {:>7}  {}",
            label,
            topic.total,
            topic.secondary_share,
            colorize_score(topic.mean_sentiment),
            truncate_chars(&topic.keywords.join(", "), 40),
        );
    }

    print_ranked(
        "Keywords",
        insights.top_keywords.iter().map(|(k, s)| (k, format!("{s:.2}"))),
    );
    print_ranked(
        "Locations",
        insights.top_locations.iter().map(|(k, n)| (k, n.to_string())),
    );
    print_ranked(
        "Mentions",
        insights.top_mentions.iter().map(|(k, n)| (k, n.to_string())),
    );
    print_ranked(
        "Hashtags",
        insights.top_hashtags.iter().map(|(k, n)| (k, n.to_string())),
    );
}

fn print_ranked<'a>(title: &str, items: impl Iterator<Item = (&'a String, String)>) {
    let line: Vec<String> = items.map(|(k, v)| format!("{k} ({v})")).collect();
    if !line.is_empty() {
        println!("\n  {} {}", format!("{title}:").bold(), line.join(", "));
    }
}

fn colorize_score(score: f64) -> colored::ColoredString {
    let text = format!("{score:+.2}");
    if score <= -0.25 {
        text.red()
    } else if score >= 0.25 {
        text.green()
    } else {
        text.yellow()
    }
}
