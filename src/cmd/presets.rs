use crate::data::Settings;
use anyhow::Result;

pub fn run() -> Result<()> {
    let settings = Settings::read()?;
    write_presets(&settings, &mut std::io::stdout())
}

pub(crate) fn write_presets<W: std::io::Write>(settings: &Settings, out: &mut W) -> Result<()> {
    let identity = settings.identity();
    writeln!(out, "Leave autofill settings")?;
    writeln!(out, "---")?;
    writeln!(out, "  {:<10} {}", "본부", identity.department)?;
    writeln!(out, "  {:<10} {}", "팀명", identity.team)?;
    writeln!(out, "  {:<10} {}", "이름", identity.name)?;
    writeln!(out, "  {:<10} {}", "자동입력", if settings.enabled { "On" } else { "Off" })?;
    if let (Some(start), Some(end)) = (&settings.vacation_start_date, &settings.vacation_end_date) {
        writeln!(out, "  {:<10} {} ~ {}", "휴가 기간", start, end)?;
    }
    writeln!(out, "---")?;
    if settings.reason_presets.is_empty() {
        writeln!(out, "  등록된 휴가사유가 없습니다.")?;
    }
    for (i, preset) in settings.reason_presets.iter().enumerate() {
        let mark = if settings.default_preset_index == Some(i) { "★" } else { " " };
        writeln!(out, "  {} {:<4} {}", mark, i + 1, preset)?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} preset(s)", settings.reason_presets.len())?;
    Ok(())
}
