//! Module capabilities
//!
//! Every module advertises exactly one capability: the role it can fill for a
//! caller ("demux", "video decoder", ...). Built-in capabilities form a closed,
//! versioned list with stable numeric ids and short string identifiers. The
//! short identifier is what appears in cache files and diagnostics.
//!
//! Two reserved forms sit next to the built-in list:
//!
//! - [`Capability::Custom`] carries an arbitrary string for capabilities the
//!   host does not know about at compile time.
//! - [`Capability::Invalid`] marks a module that intentionally declares no
//!   capability. Such modules never appear in capability queries.
//!
//! # Versioning
//!
//! Numeric ids are part of the plugin ABI. New capabilities are appended at
//! the end of the list; inserting one in the middle renumbers every later id
//! and requires an ABI version bump.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! builtin_capabilities {
    ($( $(#[$doc:meta])* $variant:ident = $id:literal, $name:literal, $desc:literal; )*) => {
        /// Built-in capability identifiers.
        ///
        /// Id `0` is reserved for "invalid" and [`CapabilityId::MAX`] is the
        /// first unused id; neither is a valid capability.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u32)]
        pub enum CapabilityId {
            $( $(#[$doc])* $variant = $id, )*
        }

        impl CapabilityId {
            /// Every built-in capability, in id order.
            pub const ALL: &'static [CapabilityId] = &[ $( CapabilityId::$variant, )* ];

            /// Short stable identifier (e.g. `"demux"`).
            pub fn as_str(self) -> &'static str {
                match self {
                    $( CapabilityId::$variant => $name, )*
                }
            }

            /// Human-readable description.
            pub fn description(self) -> &'static str {
                match self {
                    $( CapabilityId::$variant => $desc, )*
                }
            }

            /// Look up a built-in capability by numeric id.
            ///
            /// Returns `None` for the reserved "invalid" id, for the `MAX`
            /// sentinel and for anything beyond it.
            pub fn from_raw(raw: u32) -> Option<Self> {
                match raw {
                    $( $id => Some(CapabilityId::$variant), )*
                    _ => None,
                }
            }

            /// Look up a built-in capability by its short identifier.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(CapabilityId::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

builtin_capabilities! {
    /// Byte stream input (file, network, device)
    Access = 1, "access", "Input access";
    /// Byte stream output
    AccessOutput = 2, "sout access", "Output access";
    /// Audio decoder
    AudioDecoder = 3, "audio decoder", "Audio decoder";
    /// Audio encoder
    AudioEncoder = 4, "audio encoder", "Audio encoder";
    /// Audio filter
    AudioFilter = 5, "audio filter", "Audio filter";
    /// Audio sample format converter
    AudioConverter = 6, "audio converter", "Audio converter";
    /// Audio resampler
    AudioResampler = 7, "audio resampler", "Audio resampler";
    /// Audio visualization
    AudioVisualization = 8, "visualization", "Audio visualization";
    /// Audio output
    AudioOutput = 9, "audio output", "Audio output";
    /// Container demultiplexer
    Demux = 10, "demux", "Demultiplexer";
    /// Demux filter
    DemuxFilter = 11, "demux_filter", "Demux filter";
    /// Container multiplexer
    Mux = 12, "sout mux", "Multiplexer";
    /// Elementary stream packetizer
    Packetizer = 13, "packetizer", "Packetizer";
    /// Stream filter
    StreamFilter = 14, "stream_filter", "Stream filter";
    /// Stream directory listing
    StreamDirectory = 15, "stream_directory", "Stream directory";
    /// Stream output chain element
    StreamOutput = 16, "sout stream", "Stream output";
    /// Subtitle decoder
    SpuDecoder = 17, "spu decoder", "Subtitle decoder";
    /// Subtitle encoder
    SpuEncoder = 18, "spu encoder", "Subtitle encoder";
    /// Subpicture source
    SubSource = 19, "sub source", "Subpicture source";
    /// Subpicture filter
    SubFilter = 20, "sub filter", "Subpicture filter";
    /// Text renderer
    TextRenderer = 21, "text renderer", "Text renderer";
    /// Video decoder
    VideoDecoder = 22, "video decoder", "Video decoder";
    /// Video encoder
    VideoEncoder = 23, "video encoder", "Video encoder";
    /// Video filter
    VideoFilter = 24, "video filter", "Video filter";
    /// Pixel format converter
    VideoConverter = 25, "video converter", "Video converter";
    /// Video splitter
    VideoSplitter = 26, "video splitter", "Video splitter";
    /// Video output display
    VideoDisplay = 27, "vout display", "Video output display";
    /// Video output window provider
    VideoWindow = 28, "vout window", "Video window";
    /// Hardware decoder device
    DecoderDevice = 29, "decoder device", "Decoder device";
    /// User interface
    Interface = 30, "interface", "User interface";
    /// Log output
    Logger = 31, "logger", "Logger";
    /// Media discovery service
    ServicesDiscovery = 32, "services_discovery", "Services discovery";
    /// Renderer discovery service
    RendererDiscovery = 33, "renderer_discovery", "Renderer discovery";
    /// Playlist export
    PlaylistExport = 34, "playlist export", "Playlist export";
    /// Metadata reader
    MetaReader = 35, "meta reader", "Metadata reader";
    /// Metadata fetcher
    MetaFetcher = 36, "meta fetcher", "Metadata fetcher";
    /// Cover art finder
    ArtFinder = 37, "art finder", "Art finder";
    /// Credential storage
    Keystore = 38, "keystore", "Key store";
    /// TLS client
    TlsClient = 39, "tls client", "TLS client";
    /// TLS server
    TlsServer = 40, "tls server", "TLS server";
    /// XML parser
    Xml = 41, "xml", "XML parser";
    /// XML reader
    XmlReader = 42, "xml reader", "XML reader";
    /// Screensaver inhibition
    Inhibit = 43, "inhibit", "Power management inhibitor";
    /// Extension host
    Extension = 44, "extension", "Extension";
    /// Hardware acceleration context
    HwDecoder = 45, "hw decoder", "Hardware decoder";
    /// Video blending
    VideoBlending = 46, "video blending", "Video blending";
}

impl CapabilityId {
    /// Number of built-in capabilities.
    pub const COUNT: usize = Self::ALL.len();

    /// Reserved id meaning "no capability".
    pub const INVALID: u32 = 0;

    /// First id past the end of the built-in list.
    pub const MAX: u32 = Self::COUNT as u32 + 1;

    /// Numeric id.
    pub fn raw(self) -> u32 {
        self as u32
    }

    /// Zero-based slot in per-capability tables.
    pub fn slot(self) -> usize {
        self as usize - 1
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The capability advertised by a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Capability {
    /// No capability: the module only carries metadata.
    #[default]
    Invalid,
    /// One of the built-in capabilities.
    Builtin(CapabilityId),
    /// A capability known only by name.
    Custom(String),
}

impl Capability {
    /// Parse a capability name, preferring the built-in list.
    ///
    /// An empty name yields [`Capability::Invalid`].
    pub fn parse(name: &str) -> Self {
        if name.is_empty() {
            return Capability::Invalid;
        }
        match CapabilityId::from_name(name) {
            Some(id) => Capability::Builtin(id),
            None => Capability::Custom(name.to_string()),
        }
    }

    /// Construct a custom capability, still mapping built-in names.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::parse(&name.into())
    }

    /// Whether this is the invalid sentinel.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Capability::Invalid)
    }

    /// Short identifier, empty for the invalid sentinel.
    pub fn as_str(&self) -> &str {
        match self {
            Capability::Invalid => "",
            Capability::Builtin(id) => id.as_str(),
            Capability::Custom(name) => name,
        }
    }
}

impl From<CapabilityId> for Capability {
    fn from(id: CapabilityId) -> Self {
        Capability::Builtin(id)
    }
}

impl From<&str> for Capability {
    fn from(name: &str) -> Self {
        Capability::parse(name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Invalid => f.write_str("(none)"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl Serialize for Capability {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Capability::parse(&name))
    }
}
