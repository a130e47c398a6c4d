//! HTML rendering for the pages the service serves.

use std::fmt::Write;

use crate::persistence::{GameSummary, PlayerStatSheet};
use crate::report::{game_type_name, stat_fields, SeasonTopPlayers};

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n\
         <body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = escape(title),
    )
}

/// A titled page around a pre-rendered HTML message.
pub fn message_page(title: &str, message_html: &str) -> String {
    layout(title, &format!("{message_html}\n"))
}

pub fn empty_database_page() -> String {
    message_page(
        "Database empty",
        "<p>The database is empty. Click <a href=\"/update/\">here</a> \
         to fetch the data from the NHL API.</p>",
    )
}

pub fn updated_page() -> String {
    message_page(
        "Database updated",
        "<p>Database is updated. <a href=\"/\">Return to the main page</a> to view.</p>",
    )
}

pub fn database_error_page(code: Option<&str>, message: &str) -> String {
    message_page(
        "Database error",
        &format!(
            "<p>Error no: {}, msg: {}</p>",
            escape(code.unwrap_or("none")),
            escape(message)
        ),
    )
}

/// Landing page: each season with links to its top players' final games.
pub fn home_page(report: &[SeasonTopPlayers]) -> String {
    let mut body = String::new();
    for entry in report {
        let _ = writeln!(body, "<h2>Season: {}</h2>", entry.season.label());
        for player in &entry.players {
            let _ = writeln!(
                body,
                "<p><a href=\"/stats?gamePk={}&amp;personId={}\">{}</a></p>",
                player.game_pk,
                player.person_id,
                escape(&player.full_name)
            );
        }
    }
    layout("Players of the all-star game and the finals", &body)
}

fn opt(value: Option<&str>) -> String {
    value.map(escape).unwrap_or_default()
}

fn opt_num(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn table(rows: &[(&str, String)]) -> String {
    let mut out = String::from("<table>\n");
    for (label, value) in rows {
        let _ = writeln!(out, "<tr><th>{label}</th><td>{value}</td></tr>");
    }
    out.push_str("</table>\n");
    out
}

fn team_score(id: Option<i64>, name: Option<&str>, score: Option<i64>) -> String {
    format!(
        "<span data-team-id=\"{}\">{}</span> {}",
        opt_num(id),
        opt(name),
        opt_num(score)
    )
}

fn game_section(game: Option<&GameSummary>) -> String {
    let Some(g) = game else {
        return "<h2>Game</h2>\n".to_string();
    };
    format!(
        "<h2>{kind} {pk}</h2>\n<p>Season {season}, {date}</p>\n{scores}",
        kind = game_type_name(g.game_type),
        pk = g.game_pk,
        season = g.season.label(),
        date = opt(g.game_date.as_deref()),
        scores = table(&[
            ("Away", team_score(g.away_team_id, g.away_team_name.as_deref(), g.away_score)),
            ("Home", team_score(g.home_team_id, g.home_team_name.as_deref(), g.home_score)),
        ]),
    )
}

fn player_section(player: Option<&PlayerStatSheet>) -> String {
    let Some(p) = player else {
        return "<h2>Player</h2>\n".to_string();
    };
    let mut out = format!("<h2>{}</h2>\n", escape(&p.full_name));
    out.push_str(&table(&[
        ("Player id", p.person_id.to_string()),
        ("Game", p.game_pk.to_string()),
        ("Team", team_score(p.team_id, p.team_name.as_deref(), None)),
        ("Position", escape(&p.position_name)),
        ("Number", opt_num(p.jersey_number)),
        ("Born", opt(p.birth_date.as_deref())),
        ("Birth city", opt(p.birth_city.as_deref())),
        ("Birth country", opt(p.birth_country.as_deref())),
        ("Nationality", opt(p.nationality.as_deref())),
    ]));
    if let Some(stats) = &p.stats {
        let rows: Vec<_> = stat_fields(stats)
            .into_iter()
            .map(|(label, value)| (label, escape(&value)))
            .collect();
        out.push_str(&table(&rows));
    }
    out
}

/// Game summary and one player's stat sheet; missing records render as
/// empty sections.
pub fn stats_page(game: Option<&GameSummary>, player: Option<&PlayerStatSheet>) -> String {
    let body = format!(
        "{}{}<p><a href=\"/\">Back</a></p>\n",
        game_section(game),
        player_section(player)
    );
    layout("Player statistics", &body)
}
