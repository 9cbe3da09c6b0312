//! legacy exit status codes for system programs.
//! reference: [SYSEXITS](https://man.freebsd.org/cgi/man.cgi?query=sysexits&apropos=0&sektion=0&manpath=FreeBSD+11.2-stable&arch=default&format=html)

/// value: 65 <br>
/// The input data was incorrect in some way. Used when the config file is not valid TOML
/// or does not have the expected shape.
pub const EX_DATAERR: i32 = 65;

/// value: 66 <br>
/// An input file did not exist or was not readable. Used when the config file exists but
/// cannot be read.
pub const EX_NOINPUT: i32 = 66;

/// value: 70 <br>
/// An internal software error has been detected. Catch-all for fatal errors that fit no
/// other code.
pub const EX_SOFTWARE: i32 = 70;

/// value: 73 <br>
/// A (user specified) output file cannot be created. Used when the backup root or the
/// default config file cannot be written.
pub const EX_CANTCREAT: i32 = 73;

/// value: 78 <br>
/// Something was found in an unconfigured or misconfigured state. Used when the config
/// parses but fails validation.
pub const EX_CONFIG: i32 = 78;
