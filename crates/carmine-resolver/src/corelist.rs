//! The static set of core modules.
//!
//! Core modules ship with the interpreter and never need to be resolved;
//! the resolver elides them before touching any index. The set covers the
//! pragmas and the standard library, plus a handful of dual-life modules
//! that are bundled often enough to treat as core.

use ahash::AHashSet;
use std::sync::LazyLock;

static CORE_MODULES: LazyLock<AHashSet<&'static str>> =
    LazyLock::new(|| CORE_MODULE_NAMES.iter().copied().collect());

/// Whether a module is part of the interpreter's core.
#[must_use]
pub fn is_core(module: &str) -> bool {
    CORE_MODULES.contains(module)
}

#[rustfmt::skip]
const CORE_MODULE_NAMES: &[&str] = &[
    // Pragmas
    "perl", "strict", "warnings", "utf8",
    "base", "parent", "constant", "overload",
    "lib", "vars", "integer", "bytes",
    "feature", "if", "mro", "re",
    "locale", "open", "subs", "fields",
    "bignum", "bigint", "bigrat",

    // A-C
    "AnyDBM_File", "AutoLoader", "AutoSplit",
    "B", "B::Deparse", "Benchmark",
    "Carp", "Carp::Heavy", "Class::Struct",
    "Config", "Config::Extensions", "Cwd",

    // D-E
    "DB", "DBM_Filter", "Data::Dumper", "Devel::Peek",
    "Devel::SelfStubber", "Digest", "Digest::MD5",
    "DirHandle", "Dumpvalue", "DynaLoader",
    "Encode", "Encode::Alias", "Encode::Config",
    "Encode::Encoding", "Encode::Guess", "Encode::MIME::Header",
    "English", "Env", "Errno", "Exporter",
    "Exporter::Heavy", "ExtUtils::Constant",
    "ExtUtils::Embed", "ExtUtils::Install",
    "ExtUtils::Installed", "ExtUtils::Liblist",
    "ExtUtils::MM", "ExtUtils::MM_Any", "ExtUtils::MM_Unix",
    "ExtUtils::MY", "ExtUtils::Manifest", "ExtUtils::Miniperl",
    "ExtUtils::Mkbootstrap", "ExtUtils::Mksymlists",
    "ExtUtils::Packlist", "ExtUtils::testlib",

    // F
    "Fcntl", "File::Basename", "File::Compare",
    "File::Copy", "File::DosGlob", "File::Find",
    "File::Glob", "File::Path", "File::Spec",
    "File::Spec::Functions", "File::Spec::Unix",
    "File::Stat", "File::stat", "File::Temp", "FileCache", "FileHandle",
    "Filter::Simple", "Filter::Util::Call", "FindBin",

    // G-I
    "GDBM_File", "Getopt::Long", "Getopt::Std",
    "Hash::Util", "Hash::Util::FieldHash",
    "I18N::Collate", "I18N::LangTags", "I18N::Langinfo",
    "IO", "IO::Dir", "IO::File", "IO::Handle",
    "IO::Pipe", "IO::Poll", "IO::Seekable",
    "IO::Select", "IO::Socket", "IO::Socket::INET",
    "IO::Socket::UNIX", "IPC::Cmd", "IPC::Msg",
    "IPC::Open2", "IPC::Open3", "IPC::Semaphore",
    "IPC::SharedMem", "IPC::SysV",

    // L-M
    "List::Util", "List::Util::XS", "Locale::Maketext",
    "MIME::Base64", "MIME::QuotedPrint", "Math::BigFloat",
    "Math::BigInt", "Math::BigRat", "Math::Complex",
    "Math::Trig", "Memoize",

    // N-O
    "NDBM_File", "Net::Cmd", "Net::Config",
    "Net::Domain", "Net::FTP", "Net::NNTP",
    "Net::Netrc", "Net::POP3", "Net::Ping",
    "Net::SMTP", "Net::Time", "Net::hostent",
    "Net::netent", "Net::protoent", "Net::servent",
    "O", "Opcode", "ODBM_File", "OS2::Process",

    // P
    "PerlIO", "PerlIO::encoding", "PerlIO::scalar",
    "PerlIO::via", "PerlIO::via::QuotedPrint",
    "Pod::Checker", "Pod::Find", "Pod::Functions",
    "Pod::Html", "Pod::InputObjects", "Pod::Man",
    "Pod::ParseLink", "Pod::ParseUtils", "Pod::Parser",
    "Pod::Perldoc", "Pod::PlainText", "Pod::Select",
    "Pod::Simple", "Pod::Text", "Pod::Usage",
    "POSIX",

    // S
    "SDBM_File", "Safe", "Scalar::Util",
    "Search::Dict", "SelectSaver", "SelfLoader",
    "Socket", "Storable", "Sub::Util", "Symbol",
    "Sys::Hostname", "Sys::Syslog",

    // T
    "Term::ANSIColor", "Term::Cap", "Term::Complete",
    "Term::ReadLine", "Test", "Test::Builder",
    "Test::Builder::Module", "Test::Builder::Tester",
    "Test::Harness", "Test::More", "Test::Simple",
    "Text::Abbrev", "Text::Balanced", "Text::ParseWords",
    "Text::Tabs", "Text::Wrap",
    "Thread", "Thread::Queue", "Thread::Semaphore",
    "Tie::Array", "Tie::File", "Tie::Handle",
    "Tie::Hash", "Tie::Memoize", "Tie::RefHash",
    "Tie::Scalar", "Tie::StdHandle", "Tie::SubstrHash",
    "Time::HiRes", "Time::Local", "Time::Piece",
    "Time::Seconds", "Time::gmtime", "Time::localtime",
    "Time::tm",

    // U-X
    "UNIVERSAL", "Unicode::Collate", "Unicode::Normalize",
    "Unicode::UCD", "User::grent", "User::pwent",
    "XSLoader",

    // Dual-life modules bundled often enough to treat as core
    "version", "threads", "threads::shared",
    "encoding", "encoding::warnings",
];
