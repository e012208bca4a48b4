//! Server-rendered pages and htmx fragments.
//!
//! Markup is assembled with `format!`; every interpolated user or model
//! string goes through [`escape_html`].

use std::collections::HashSet;

use liftwise_core::program::{DayPlan, ExercisePrescription, Program};
use liftwise_core::text::escape_html;
use liftwise_core::tracker::{DayProgress, LoggedSet};
use liftwise_db::models::{DayCompletion, Routine, SetLog};
use uuid::Uuid;

const HTMX_SRC: &str = "https://unpkg.com/htmx.org@2.0.4";

/// Swap error fragments too, so alerts render in place.
const HTMX_CONFIG: &str = r#"{"responseHandling":[{"code":"204","swap":false},{"code":"[23]..","swap":true},{"code":"[45]..","swap":true,"error":true}]}"#;

/// Full HTML document around `body`.
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\
<html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<meta name=\"htmx-config\" content='{HTMX_CONFIG}'>\
<title>{title}</title>\
<script src=\"{HTMX_SRC}\"></script></head>\
<body><main id=\"content\">{body}</main></body></html>",
        title = escape_html(title),
    )
}

pub fn alert(message: &str) -> String {
    format!(
        "<div class=\"alert alert-error\" role=\"alert\">{}</div>",
        escape_html(message)
    )
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

pub fn goals_form() -> String {
    "<section id=\"wizard\">\
<h2>1. Goals</h2>\
<form hx-post=\"/goals\" hx-encoding=\"multipart/form-data\" hx-target=\"#wizard\" hx-swap=\"outerHTML\">\
<label>What do you want out of training?<textarea name=\"goals\" required></textarea></label>\
<label>Program you already like (optional)<input type=\"text\" name=\"program_ref\"></label>\
<label>Upload an existing program (optional)<input type=\"file\" name=\"import_file\"></label>\
<button type=\"submit\">Next</button>\
</form></section>"
        .to_string()
}

pub fn equipment_form() -> String {
    "<section id=\"wizard\">\
<h2>2. Equipment</h2>\
<form hx-post=\"/equipment\" hx-target=\"#wizard\" hx-swap=\"outerHTML\">\
<label>What equipment do you have?<textarea name=\"equipment\" required></textarea></label>\
<button type=\"submit\">Next</button>\
</form></section>"
        .to_string()
}

pub fn schedule_form() -> String {
    "<section id=\"wizard\">\
<h2>3. Schedule</h2>\
<form hx-post=\"/schedule\" hx-target=\"#wizard\" hx-swap=\"outerHTML\">\
<label>Days per week<input type=\"number\" name=\"days_per_week\" min=\"1\" max=\"7\" value=\"3\" required></label>\
<label>Weeks<input type=\"number\" name=\"weeks\" min=\"1\" max=\"52\" value=\"8\" required></label>\
<button type=\"submit\">Build my program</button>\
</form></section>"
        .to_string()
}

/// Start page: existing programs (if any) followed by the goals form.
pub fn index_page(routines: &[Routine]) -> String {
    let list = if routines.is_empty() {
        String::new()
    } else {
        let items = routines
            .iter()
            .map(|r| {
                format!(
                    "<li><a href=\"/routine/{id}\">{title}</a> <small>{created}</small></li>",
                    id = r.id,
                    title = escape_html(&r.title),
                    created = r.created_at.format("%Y-%m-%d"),
                )
            })
            .collect::<String>();
        format!("<section><h2>Your programs</h2><ul>{items}</ul></section>")
    };
    page("liftwise", &format!("<h1>liftwise</h1>{list}{}", goals_form()))
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub fn day_url(routine_id: Uuid, week: u32, day: u32) -> String {
    format!("/routine/{routine_id}/week/{week}/day/{day}")
}

pub fn dashboard_page(
    routine_id: Uuid,
    program: &Program,
    completions: &[DayCompletion],
    program_json: &str,
) -> String {
    let finished: HashSet<(i32, i32)> = completions.iter().map(|c| (c.week, c.day)).collect();

    let weeks = program
        .weeks
        .iter()
        .map(|w| {
            let days = w
                .days
                .iter()
                .map(|d| {
                    let done = i32::try_from(w.week)
                        .ok()
                        .zip(i32::try_from(d.day).ok())
                        .is_some_and(|key| finished.contains(&key));
                    format!(
                        "<li class=\"day{class}\"><a href=\"{url}\">Day {day}</a> \
                         <small>{n} exercises, {sets} sets</small>{mark}</li>",
                        class = if done { " finished" } else { "" },
                        url = day_url(routine_id, w.week, d.day),
                        day = d.day,
                        n = d.exercises.len(),
                        sets = d.prescribed_sets(),
                        mark = if done { " <span class=\"done\">&#10003; finished</span>" } else { "" },
                    )
                })
                .collect::<String>();
            format!(
                "<div class=\"week card\"><h3>Week {week}</h3><ul>{days}</ul></div>",
                week = w.week
            )
        })
        .collect::<String>();

    let body = format!(
        "<h1>{title}</h1><p class=\"summary\">{summary}</p>\
<p><a href=\"/\">Start over</a></p>\
<div class=\"weeks\">{weeks}</div>\
<details><summary>Edit program JSON</summary>\
<div id=\"edit-result\"></div>\
<form hx-post=\"/routine/{routine_id}/update\" hx-target=\"#edit-result\">\
<textarea name=\"program_json\" rows=\"24\" cols=\"80\">{json}</textarea>\
<button type=\"submit\">Save</button></form></details>",
        title = escape_html(&program.title),
        summary = escape_html(&program.summary),
        json = escape_html(program_json),
    );
    page(&program.title, &body)
}

// ---------------------------------------------------------------------------
// Day view
// ---------------------------------------------------------------------------

/// Only plain web links are rendered as anchors.
fn is_web_link(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

fn exercise_card(routine_id: Uuid, week: u32, day: u32, ex: &ExercisePrescription) -> String {
    let log_url = format!("{}/log", day_url(routine_id, week, day));
    let rir = ex
        .rir
        .map_or_else(|| "&ndash;".to_string(), |r| r.to_string());
    let muscle = ex
        .muscle_targeted
        .as_deref()
        .map(|m| format!(" <small class=\"muscle\">{}</small>", escape_html(m)))
        .unwrap_or_default();
    let demo = ex
        .exercise_example
        .as_deref()
        .filter(|url| is_web_link(url))
        .map(|url| {
            format!(
                "<a class=\"demo\" href=\"{}\" target=\"_blank\" rel=\"noopener\">demo</a>",
                escape_html(url)
            )
        })
        .unwrap_or_default();

    let rows = (1..=ex.sets)
        .map(|n| {
            format!(
                "<tr><td>{n}</td><td colspan=\"3\">\
<form hx-post=\"{log_url}\" hx-target=\"closest tr\" hx-swap=\"outerHTML\">\
<input type=\"hidden\" name=\"exercise_name\" value=\"{name}\">\
<input type=\"hidden\" name=\"set_number\" value=\"{n}\">\
<input type=\"number\" name=\"weight\" step=\"0.5\" min=\"0\" placeholder=\"weight\" required>\
<input type=\"number\" name=\"reps\" min=\"0\" placeholder=\"reps\" required>\
<input type=\"text\" name=\"notes\" placeholder=\"notes\">\
<button type=\"submit\">Log</button></form></td></tr>",
                name = escape_html(&ex.name),
            )
        })
        .collect::<String>();

    format!(
        "<div class=\"exercise card\"><h3>{name}{muscle}</h3>\
<p>{sets} &times; {reps} @ RIR {rir} {demo}</p>\
<table><tr><th>Set</th><th colspan=\"3\">Weight / Reps / Notes</th></tr>{rows}</table></div>",
        name = escape_html(&ex.name),
        sets = ex.sets,
        reps = escape_html(&ex.reps),
    )
}

/// The finish button, or a progress note while sets remain.
pub fn finish_control(routine_id: Uuid, week: u32, day: u32, progress: &DayProgress) -> String {
    let url = day_url(routine_id, week, day);
    let inner = if progress.finished {
        "<p class=\"finished\">&#10003; Day finished</p>".to_string()
    } else if progress.can_finish() {
        format!("<button hx-post=\"{url}/finish\" class=\"finish\">Finish day</button>")
    } else {
        format!(
            "<p class=\"remaining\">{logged} of {prescribed} sets logged</p>",
            logged = progress.logged,
            prescribed = progress.prescribed
        )
    };
    format!(
        "<div id=\"finish\" hx-get=\"{url}/status\" hx-trigger=\"set-logged from:body\" \
         hx-swap=\"outerHTML\" data-state=\"{state}\">{inner}</div>",
        state = progress.state(),
    )
}

pub fn logged_sets_list(logs: &[SetLog]) -> String {
    if logs.is_empty() {
        return String::new();
    }
    let items = logs
        .iter()
        .map(|l| {
            format!(
                "<li>{name} set {n}: {weight} &times; {reps}{notes}</li>",
                name = escape_html(&l.exercise_name),
                n = l.set_number,
                weight = l.weight,
                reps = l.reps,
                notes = l
                    .notes
                    .as_deref()
                    .map(|n| format!(" <em>{}</em>", escape_html(n)))
                    .unwrap_or_default(),
            )
        })
        .collect::<String>();
    format!("<section class=\"logged\"><h3>Logged</h3><ul>{items}</ul></section>")
}

pub fn day_page(
    routine_id: Uuid,
    title: &str,
    week: u32,
    day_plan: &DayPlan,
    progress: &DayProgress,
    logs: &[SetLog],
) -> String {
    let day = day_plan.day;
    let cards = day_plan
        .exercises
        .iter()
        .map(|ex| exercise_card(routine_id, week, day, ex))
        .collect::<String>();

    let body = format!(
        "<p><a href=\"/routine/{routine_id}\">&larr; {title}</a></p>\
<h1>Week {week} &middot; Day {day}</h1>\
{cards}{logged}{finish}",
        title = escape_html(title),
        logged = logged_sets_list(logs),
        finish = finish_control(routine_id, week, day, progress),
    );
    page(&format!("Week {week} Day {day}"), &body)
}

/// Row that replaces a set's log form once it is saved.
pub fn logged_set_row(logged: &LoggedSet) -> String {
    let log = &logged.log;
    let record = if logged.personal_record {
        " <strong class=\"pr\">&#127942; New PR!</strong>"
    } else {
        ""
    };
    format!(
        "<tr class=\"logged\"><td>{n}</td><td colspan=\"3\" class=\"text-success\">\
&#9989; {weight} &times; {reps} <small>est. 1RM {e1rm:.1}</small>{record}</td></tr>",
        n = log.set_number,
        weight = log.weight,
        reps = log.reps,
        e1rm = logged.estimated_one_rep_max,
    )
}
