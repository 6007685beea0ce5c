use std::fmt::Display;

const BANNER_WIDTH: usize = 72;
const KEY_WIDTH: usize = 16;
const LOGO: &[&str] = &[
    r" ______ _      ____ _______ _____ _      _               ",
    r"|  ____| |    / __ \__   __|_   _| |    | |        /\     ",
    r"| |__  | |   | |  | | | |    | | | |    | |       /  \    ",
    r"|  __| | |   | |  | | | |    | | | |    | |      / /\ \   ",
    r"| |    | |___| |__| | | |   _| |_| |____| |____ / ____ \  ",
    r"|_|    |______\____/  |_|  |_____|______|______/_/    \_\ ",
];

#[derive(Debug, Clone, Copy)]
enum Level {
    Info,
    Success,
    Warn,
    Error,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => " OK ",
            Self::Warn => "WARN",
            Self::Error => "ERR ",
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Self::Warn | Self::Error)
    }
}

pub fn startup_banner(title: &str, subtitle: &str, lines: &[(&str, String)]) {
    let border = "=".repeat(BANNER_WIDTH);
    let divider = "-".repeat(BANNER_WIDTH);
    println!();
    println!("{border}");
    for row in LOGO {
        println!("{row:^BANNER_WIDTH$}");
    }
    println!("{divider}");
    println!("{title:^BANNER_WIDTH$}");
    println!("{subtitle:^BANNER_WIDTH$}");
    println!("{border}");
    for (key, value) in lines {
        let key = format!("{key}:");
        println!("  {key:<KEY_WIDTH$} {value}");
    }
    println!("{border}");
    println!();
}

pub fn info(tag: &str, message: impl Display) {
    emit(Level::Info, tag, message);
}

pub fn success(tag: &str, message: impl Display) {
    emit(Level::Success, tag, message);
}

pub fn warn(tag: &str, message: impl Display) {
    emit(Level::Warn, tag, message);
}

pub fn error(tag: &str, message: impl Display) {
    emit(Level::Error, tag, message);
}

fn emit(level: Level, tag: &str, message: impl Display) {
    let line = format!("[{}][{tag:<8}] {message}", level.label());
    if level.to_stderr() {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}
