use std::fmt;

pub const DEFAULT_TARGET: &str = "default";
pub const ANY_TARGET: &str = "any";

pub const TARGET_TRIPLE_TOKEN: &str = "${TARGET_TRIPLE}";
pub const LIB_EXT_TOKEN: &str = "${LIB_EXT}";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Android,
    Linux,
    Web,
    Windows,
    Darwin,
}

impl OsFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            OsFamily::Android => "android",
            OsFamily::Linux => "linux",
            OsFamily::Web => "web",
            OsFamily::Windows => "windows",
            OsFamily::Darwin => "darwin",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct TargetDescriptor {
    pub triple: &'static str,
    pub family: OsFamily,
}

static TARGET_REGISTRY: &[TargetDescriptor] = &[
    TargetDescriptor {
        triple: "android-arm",
        family: OsFamily::Android,
    },
    TargetDescriptor {
        triple: "android-arm64",
        family: OsFamily::Android,
    },
    TargetDescriptor {
        triple: "linux-arm64",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "linux-armv5-musl",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "linux-armv5",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "linux-armv6",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "linux-armv7",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "linux-armv7a",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "linux-mips",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "linux-mipsel",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "linux-ppc64le",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "linux-s390x",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "linux-x64",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "linux-x86",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "manylinux-common",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "manylinux1-x64",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "manylinux1-x86",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "manylinux2010-x64",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "manylinux2010-x86",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "manylinux2014-aarch64",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "manylinux2014-x64",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "manylinux2014-x86",
        family: OsFamily::Linux,
    },
    TargetDescriptor {
        triple: "web-wasm",
        family: OsFamily::Web,
    },
    TargetDescriptor {
        triple: "windows-shared-x64-posix",
        family: OsFamily::Windows,
    },
    TargetDescriptor {
        triple: "windows-shared-x64",
        family: OsFamily::Windows,
    },
    TargetDescriptor {
        triple: "windows-shared-x86",
        family: OsFamily::Windows,
    },
    TargetDescriptor {
        triple: "windows-static-x64-posix",
        family: OsFamily::Windows,
    },
    TargetDescriptor {
        triple: "windows-static-x64",
        family: OsFamily::Windows,
    },
    TargetDescriptor {
        triple: "windows-static-x86",
        family: OsFamily::Windows,
    },
    TargetDescriptor {
        triple: "apple-darwin-x64",
        family: OsFamily::Darwin,
    },
    TargetDescriptor {
        triple: "apple-darwin-x86",
        family: OsFamily::Darwin,
    },
    TargetDescriptor {
        triple: "apple-darwin-arm64",
        family: OsFamily::Darwin,
    },
];

pub fn registry() -> &'static [TargetDescriptor] {
    TARGET_REGISTRY
}

pub fn known_targets() -> Vec<&'static str> {
    registry().iter().map(|entry| entry.triple).collect()
}

/// The synthetic local target builds through the linux fallback blocks.
pub fn os_family(target: &str) -> Option<OsFamily> {
    if target == DEFAULT_TARGET {
        return Some(OsFamily::Linux);
    }
    registry()
        .iter()
        .find(|entry| entry.triple == target)
        .map(|entry| entry.family)
}

/// Substring rule, last test wins: `windows` then `darwin`, else `so`.
pub fn library_extension(target: &str) -> &'static str {
    let mut extension = "so";
    if target.contains("windows") {
        extension = "dll";
    }
    if target.contains("darwin") {
        extension = "dylib";
    }
    extension
}

pub fn expand_tokens(target: &str, text: &str) -> String {
    text.replace(TARGET_TRIPLE_TOKEN, target)
        .replace(LIB_EXT_TOKEN, library_extension(target))
}
