//! Argumentos de linha de comando do sender.

use std::path::PathBuf;

/// Opções aceitas na linha de comando.
#[derive(Debug, Default, PartialEq)]
pub struct SenderArgs {
    /// `--config <path>`
    pub config_path: Option<PathBuf>,
    /// `--console`: imprime os frames em vez de enviar pelo rádio
    pub console: bool,
    /// `--frames <n>`: encerra após N frames
    pub frames: Option<u64>,
}

impl SenderArgs {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, String> {
        let mut parsed = SenderArgs::default();
        let mut it = args.into_iter();

        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--config" => {
                    let path = it.next().ok_or("--config requer um caminho")?;
                    parsed.config_path = Some(PathBuf::from(path));
                }
                "--console" => parsed.console = true,
                "--frames" => {
                    let n = it.next().ok_or("--frames requer um número")?;
                    let n = n
                        .parse::<u64>()
                        .map_err(|_| format!("--frames inválido: {n}"))?;
                    parsed.frames = Some(n);
                }
                other => return Err(format!("Argumento desconhecido: {other}")),
            }
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<SenderArgs, String> {
        SenderArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_args_is_default() {
        assert_eq!(parse(&[]).unwrap(), SenderArgs::default());
    }

    #[test]
    fn all_flags() {
        let a = parse(&["--console", "--frames", "10", "--config", "x.toml"]).unwrap();
        assert!(a.console);
        assert_eq!(a.frames, Some(10));
        assert_eq!(a.config_path, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn rejects_unknown_and_incomplete() {
        assert!(parse(&["--verbose"]).is_err());
        assert!(parse(&["--frames"]).is_err());
        assert!(parse(&["--frames", "muitos"]).is_err());
        assert!(parse(&["--config"]).is_err());
    }
}
