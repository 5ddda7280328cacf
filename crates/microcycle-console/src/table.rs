//! Plain-text rendering of state snapshots.

use std::fmt::Write as _;

use microcycle_core::{CellKind, ProgramEntry, ProfileId, StateView};

pub const RULE_WIDTH: usize = 60;

pub fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

/// Draws `text` inside a `+---+` box, wrapping on whitespace.
pub fn boxed(text: &str) -> String {
    let inner = RULE_WIDTH - 4;
    let border = format!("+{}+", "-".repeat(RULE_WIDTH - 2));
    let mut out = format!("{border}\n");
    for line in wrap(text, inner) {
        let _ = writeln!(out, "| {line:<inner$} |");
    }
    out.push_str(&border);
    out
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Full screen for one snapshot: registers, units, memory, message.
pub fn render_view(view: &StateView, message: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule('='));
    let _ = writeln!(out, "{} - {}", view.title, view.program);
    let _ = writeln!(out, "{}", rule('='));

    out.push_str("\nREGISTERS:\n");
    for row in &view.registers {
        let _ = writeln!(
            out,
            "  {:<4} {:>14}  ({} bits)",
            row.name, row.formatted, row.width
        );
    }

    out.push_str("\nCONTROL UNITS:\n");
    for row in &view.units {
        let _ = writeln!(out, "  {:<8} {}", row.unit.name(), row.status);
    }

    out.push_str("\nRELEVANT MEMORY:\n");
    for (kind, heading) in [
        (CellKind::Instruction, "Instructions"),
        (CellKind::Data, "Data"),
    ] {
        let _ = writeln!(out, "  {heading}:");
        let mut any = false;
        for row in view.cells(kind) {
            any = true;
            let _ = writeln!(
                out,
                "    [{:>5}] {:>14}  {}",
                row.formatted_address, row.formatted_value, row.content
            );
        }
        if !any {
            out.push_str("    (empty)\n");
        }
    }

    let (cursor, total) = view.progress;
    let _ = writeln!(out, "\nPROGRESS: {cursor}/{total} ({})", view.state);
    out.push_str("\nCURRENT MESSAGE:\n");
    out.push_str(&boxed(message));
    out.push('\n');
    out
}

/// Catalog listing used by `--list`: programs, then the opcode table.
pub fn render_catalog(catalog: &[(ProfileId, Vec<ProgramEntry>)]) -> String {
    let mut out = String::new();
    for (profile, programs) in catalog {
        let _ = writeln!(out, "{} ({}):", profile, profile.key());
        for entry in programs {
            let _ = writeln!(out, "  {}. {}", menu_number(entry.id), entry.name);
        }
        let machine = profile.profile();
        let bits = usize::try_from(machine.format().opcode_bits).unwrap_or(8);
        let _ = writeln!(out, "  Instruction set:");
        for entry in machine.opcodes() {
            let _ = writeln!(out, "    {:0bits$b}  {}", entry.code, entry.template());
        }
    }
    out
}

/// One-based menu number of a zero-based program id.
pub const fn menu_number(id: usize) -> usize {
    id + 1
}

#[cfg(test)]
mod tests {
    use super::{boxed, render_catalog, render_view, wrap, RULE_WIDTH};
    use microcycle_core::{list_programs, new_session, ProfileId};

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(
            wrap("Execute cycle - Add MBR (10) to AC (5) = 15", 20),
            vec!["Execute cycle - Add", "MBR (10) to AC (5) =", "15"]
        );
        assert_eq!(wrap("", 10), vec![String::new()]);
    }

    #[test]
    fn boxed_lines_share_one_width() {
        let text = boxed("Fetch cycle - Copy PC (0x100) to MAR");
        assert!(text.lines().all(|line| line.chars().count() == RULE_WIDTH));
    }

    #[test]
    fn view_lists_registers_and_memory() {
        let session = new_session(ProfileId::Hypothetical, 0).unwrap();
        let text = render_view(&session.snapshot(), &session.status_line());

        assert!(text.contains("HYPOTHETICAL MACHINE - Basic Sum (5 + 10)"));
        assert!(text.contains("0x100  (12 bits)"));
        assert!(text.contains("ADD M(0x201)"));
        assert!(text.contains("Waiting to start"));
        assert!(text.contains("PROGRESS: 0/26 (loaded)"));
    }

    #[test]
    fn catalog_lists_every_program() {
        let catalog = vec![(ProfileId::Ias, list_programs(ProfileId::Ias))];
        let text = render_catalog(&catalog);
        assert!(text.starts_with("IAS machine (ias):\n  1. Basic Sum (5 + 10)\n"));
        assert!(text.contains("  2. Multiply and Divide (20 * 4, 20 / 4)"));
    }

    #[test]
    fn catalog_prints_the_opcode_table_in_binary() {
        let catalog = vec![(
            ProfileId::Hypothetical,
            list_programs(ProfileId::Hypothetical),
        )];
        let text = render_catalog(&catalog);
        assert!(text.contains("  Instruction set:\n"));
        assert!(text.contains("    0101  ADD M(X)\n"));

        let catalog = vec![(ProfileId::Ias, list_programs(ProfileId::Ias))];
        assert!(render_catalog(&catalog).contains("    00001111  DIV M(X)\n"));
    }
}
