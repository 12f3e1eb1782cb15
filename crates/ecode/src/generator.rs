use rand::Rng;

pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const CODE_CHARS: usize = 16;
pub const GROUP_LEN: usize = 4;

/// Source of candidate codes. Uniqueness is the caller's job.
pub trait CodeSource: Send + Sync {
    fn next_code(&self) -> String;
}

/// 16 independent uniform draws from `A-Z0-9`, grouped `XXXX-XXXX-XXXX-XXXX`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn next_code(&self) -> String {
        let mut rng = rand::thread_rng();
        let raw: Vec<u8> = (0..CODE_CHARS)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())])
            .collect();
        format_code(&raw)
    }
}

fn format_code(raw: &[u8]) -> String {
    raw.chunks(GROUP_LEN)
        .map(|group| String::from_utf8_lossy(group).into_owned())
        .collect::<Vec<_>>()
        .join("-")
}

/// True if `code` has the shape produced by `RandomCodes`.
pub fn is_well_formed(code: &str) -> bool {
    let groups: Vec<&str> = code.split('-').collect();
    groups.len() == CODE_CHARS / GROUP_LEN
        && groups.iter().all(|g| {
            g.len() == GROUP_LEN && g.bytes().all(|b| CODE_ALPHABET.contains(&b))
        })
}
