//! Colored terminal output for the delve-server CLI.

use crate::research::PipelineEvent;
use crate::types::ResearchResponse;
use owo_colors::OwoColorize;

/// Terminal printer, colored unless disabled.
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "delve".bright_cyan().bold(),
                version.dimmed(),
                "deep research server".bright_white()
            );
        } else {
            println!("\n   delve {}\n   deep research server\n", version);
        }
    }

    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// One status line per streamed pipeline event.
    pub fn event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Start { trace_id, query, .. } => {
                self.info(&format!("Researching \"{}\"", query));
                self.kv("trace", trace_id);
            }
            PipelineEvent::StatusUpdate { message, .. } => self.info(message),
            PipelineEvent::PlanComplete { searches, message, .. } => {
                self.success(message);
                for intent in searches {
                    self.list_item(&format!("{} ({})", intent.query, intent.reason));
                }
            }
            PipelineEvent::SearchStarted { search_index, query, .. } => {
                if self.colored {
                    println!(
                        "  {} {}",
                        format!("[{}]", search_index + 1).dimmed(),
                        query.bright_white()
                    );
                } else {
                    println!("  [{}] {}", search_index + 1, query);
                }
            }
            PipelineEvent::SearchComplete {
                result_summary,
                message,
                ..
            } => match result_summary {
                Some(_) => self.success(message),
                None => self.warning(message),
            },
            PipelineEvent::Complete {
                trace_id,
                report,
                summary,
                follow_up_questions,
                ..
            } => self.report(&ResearchResponse {
                trace_id: trace_id.clone(),
                report: report.clone(),
                summary: summary.clone(),
                follow_up_questions: follow_up_questions.clone(),
            }),
            PipelineEvent::Error { message, .. } => self.error(message),
        }
    }

    /// Print a finished report.
    pub fn report(&self, response: &ResearchResponse) {
        self.header("Summary");
        println!("  {}", response.summary);

        self.header("Report");
        println!("{}", response.report);

        if !response.follow_up_questions.is_empty() {
            self.header("Follow-up questions");
            for question in &response.follow_up_questions {
                self.list_item(question);
            }
        }

        self.hint(&format!("trace id: {}", response.trace_id));
    }
}
