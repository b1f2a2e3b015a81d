//! Static command catalog: the declarative wire-format description every
//! encoder call is driven by. The table mirrors the device's command set;
//! entries are plain data and carry no behavior.

use crate::core::WriteMode;

/// Declared numeric or text type of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    U8,
    U16,
    I8,
    I16,
    /// Raw text substituted verbatim into the template.
    Text,
}

impl ParamType {
    /// Natural range of the type, used when the definition declares no
    /// explicit bounds and as the final validity check after clamping.
    pub fn natural_range(self) -> (i64, i64) {
        match self {
            ParamType::U8 => (0, 0xFF),
            ParamType::U16 => (0, 0xFFFF),
            ParamType::I8 => (i8::MIN as i64, i8::MAX as i64),
            ParamType::I16 => (i16::MIN as i64, i16::MAX as i64),
            // Text carries no numeric range; callers never clamp it.
            ParamType::Text => (i64::MIN, i64::MAX),
        }
    }
}

/// Descriptor for a single named command parameter.
#[derive(Debug)]
pub struct ParameterDefinition {
    pub name: &'static str,
    pub ty: ParamType,
    /// Declared lower bound; falls back to the type's natural minimum.
    pub min: Option<i64>,
    /// Declared upper bound; falls back to the type's natural maximum.
    pub max: Option<i64>,
    /// Value used when the caller omits the parameter.
    pub default: Option<i64>,
}

impl ParameterDefinition {
    /// Effective clamping bounds: declared limits over the natural range.
    pub fn bounds(&self) -> (i64, i64) {
        let (nat_min, nat_max) = self.ty.natural_range();
        (self.min.unwrap_or(nat_min), self.max.unwrap_or(nat_max))
    }
}

/// Which characteristic role the encoded payload targets. The concrete UUID
/// is resolved against the detected profile at send time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRole {
    Write,
    WriteNoResponse,
}

/// Descriptor for an entire command layout.
#[derive(Debug)]
pub struct CommandDefinition {
    /// Characteristic role the payload is written to.
    pub target: TargetRole,
    /// GATT write mode.
    pub write_mode: WriteMode,
    /// Hex payload template with `{name}`, `{name:02X}` and `{name:04X}`
    /// placeholders.
    pub template: &'static str,
    /// Declared parameters, substituted into the template in order.
    pub params: &'static [ParameterDefinition],
    /// Hex string appended after substitution (empty = none).
    pub terminator: &'static str,
    /// Append a CRC16-CCITT trailer (low byte first) when set.
    pub crc: bool,
    /// User-facing description.
    pub description: &'static str,
}

/// Named command within a category.
#[derive(Debug)]
pub struct CommandEntry {
    pub name: &'static str,
    pub definition: CommandDefinition,
}

/// Group of related commands.
#[derive(Debug)]
pub struct CommandCategory {
    pub name: &'static str,
    pub commands: &'static [CommandEntry],
}

const fn u8_param(name: &'static str, max: i64, default: i64) -> ParameterDefinition {
    ParameterDefinition {
        name,
        ty: ParamType::U8,
        min: Some(0),
        max: Some(max),
        default: Some(default),
    }
}

/// The full command set understood by the display firmware.
pub static COMMAND_CATALOG: &[CommandCategory] = &[
    CommandCategory {
        name: "power",
        commands: &[
            CommandEntry {
                name: "on",
                definition: CommandDefinition {
                    target: TargetRole::Write,
                    write_mode: WriteMode::WithResponse,
                    template: "CC{brightness:02X}33C33C",
                    params: &[u8_param("brightness", 255, 255)],
                    terminator: "",
                    crc: false,
                    description: "Power on with brightness",
                },
            },
            CommandEntry {
                name: "off",
                definition: CommandDefinition {
                    target: TargetRole::Write,
                    write_mode: WriteMode::WithResponse,
                    template: "CC2433C33C",
                    params: &[],
                    terminator: "",
                    crc: false,
                    description: "Power off",
                },
            },
        ],
    },
    CommandCategory {
        name: "brightness",
        commands: &[CommandEntry {
            name: "set",
            definition: CommandDefinition {
                target: TargetRole::Write,
                write_mode: WriteMode::WithResponse,
                template: "CC{value:02X}33C33C",
                params: &[u8_param("value", 100, 50)],
                terminator: "",
                crc: false,
                description: "Set brightness 0-100%",
            },
        }],
    },
    CommandCategory {
        name: "color",
        commands: &[CommandEntry {
            name: "rgb",
            definition: CommandDefinition {
                target: TargetRole::Write,
                write_mode: WriteMode::WithResponse,
                template: "CC{r:02X}{g:02X}{b:02X}33C33C",
                params: &[
                    u8_param("r", 255, 255),
                    u8_param("g", 255, 255),
                    u8_param("b", 255, 255),
                ],
                terminator: "",
                crc: false,
                description: "Set RGB color",
            },
        }],
    },
    CommandCategory {
        name: "scene",
        commands: &[
            CommandEntry {
                name: "static",
                definition: CommandDefinition {
                    target: TargetRole::Write,
                    write_mode: WriteMode::WithResponse,
                    template: "CC{r:02X}{g:02X}{b:02X}0133C33C",
                    params: &[
                        u8_param("r", 255, 255),
                        u8_param("g", 255, 255),
                        u8_param("b", 255, 255),
                    ],
                    terminator: "",
                    crc: false,
                    description: "Static color scene",
                },
            },
            CommandEntry {
                name: "breathe",
                definition: CommandDefinition {
                    target: TargetRole::Write,
                    write_mode: WriteMode::WithResponse,
                    template: "CC{r:02X}{g:02X}{b:02X}0233C33C",
                    params: &[
                        u8_param("r", 255, 255),
                        u8_param("g", 255, 255),
                        u8_param("b", 255, 255),
                    ],
                    terminator: "",
                    crc: false,
                    description: "Breathing effect",
                },
            },
        ],
    },
    // Animation frames use the AA55 .. 55AA framing with the trailer kept as
    // a declared terminator.
    CommandCategory {
        name: "animation",
        commands: &[
            CommandEntry {
                name: "rainbow",
                definition: CommandDefinition {
                    target: TargetRole::Write,
                    write_mode: WriteMode::WithResponse,
                    template: "AA5501{speed:02X}{bright:02X}",
                    params: &[u8_param("speed", 255, 32), u8_param("bright", 255, 128)],
                    terminator: "55AA",
                    crc: false,
                    description: "Rainbow animation",
                },
            },
            CommandEntry {
                name: "marquee",
                definition: CommandDefinition {
                    target: TargetRole::Write,
                    write_mode: WriteMode::WithResponse,
                    template: "AA5502{speed:02X}{bright:02X}{r:02X}{g:02X}{b:02X}",
                    params: &[
                        u8_param("speed", 255, 32),
                        u8_param("bright", 255, 128),
                        u8_param("r", 255, 0),
                        u8_param("g", 255, 128),
                        u8_param("b", 255, 255),
                    ],
                    terminator: "55AA",
                    crc: false,
                    description: "Marquee animation",
                },
            },
            CommandEntry {
                name: "blink",
                definition: CommandDefinition {
                    target: TargetRole::Write,
                    write_mode: WriteMode::WithResponse,
                    template: "AA5503{speed:02X}{bright:02X}{r:02X}{g:02X}{b:02X}",
                    params: &[
                        u8_param("speed", 255, 32),
                        u8_param("bright", 255, 128),
                        u8_param("r", 255, 0),
                        u8_param("g", 255, 128),
                        u8_param("b", 255, 255),
                    ],
                    terminator: "55AA",
                    crc: false,
                    description: "Blink animation",
                },
            },
            CommandEntry {
                name: "waves",
                definition: CommandDefinition {
                    target: TargetRole::Write,
                    write_mode: WriteMode::WithResponse,
                    template: "AA5504{speed:02X}{bright:02X}{r:02X}{g:02X}{b:02X}",
                    params: &[
                        u8_param("speed", 255, 32),
                        u8_param("bright", 255, 128),
                        u8_param("r", 255, 0),
                        u8_param("g", 255, 128),
                        u8_param("b", 255, 255),
                    ],
                    terminator: "55AA",
                    crc: false,
                    description: "Waves animation",
                },
            },
            CommandEntry {
                name: "noise",
                definition: CommandDefinition {
                    target: TargetRole::Write,
                    write_mode: WriteMode::WithResponse,
                    template: "AA5505{speed:02X}{bright:02X}",
                    params: &[u8_param("speed", 255, 32), u8_param("bright", 255, 128)],
                    terminator: "55AA",
                    crc: false,
                    description: "Noise animation",
                },
            },
        ],
    },
];

/// Look up a command definition; `None` when the category or command is
/// absent from the catalog.
pub fn lookup(category: &str, command: &str) -> Option<&'static CommandDefinition> {
    COMMAND_CATALOG
        .iter()
        .find(|c| c.name == category)?
        .commands
        .iter()
        .find(|c| c.name == command)
        .map(|c| &c.definition)
}

/// Iterate `(category, command)` pairs, for UI listings.
pub fn available_commands() -> impl Iterator<Item = (&'static str, &'static str)> {
    COMMAND_CATALOG
        .iter()
        .flat_map(|cat| cat.commands.iter().map(|cmd| (cat.name, cmd.name)))
}
