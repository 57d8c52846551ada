use crate::note::{Category, Kind, Level};

macro_rules! kind {
  ($const_name:ident, $name:expr, $category:ident, $level:ident, $summary:expr, $text:expr) => {
    pub const $const_name: Kind = Kind {
      name: $name,
      category: Category::$category,
      level: Level::$level,
      summary_template: $summary,
      text_template: $text,
    };
  };
}

// --- header registry gates (4.2) ---

kind!(
  REQUEST_HDR_IN_RESPONSE,
  "REQUEST_HDR_IN_RESPONSE",
  General,
  Bad,
  "%(field_name)s is a request header and shouldn't be used in a response.",
  "`%(field_name)s` is only defined for requests; its presence here has no effect."
);
kind!(
  RESPONSE_HDR_IN_REQUEST,
  "RESPONSE_HDR_IN_REQUEST",
  General,
  Bad,
  "%(field_name)s is a response header and shouldn't be used in a request.",
  "`%(field_name)s` is only defined for responses; its presence here has no effect."
);
kind!(
  HEADER_DEPRECATED,
  "HEADER_DEPRECATED",
  General,
  Warn,
  "The %(field_name)s header is deprecated.",
  "See %(deprecation_reference)s for details."
);
kind!(
  BAD_SYNTAX,
  "BAD_SYNTAX",
  General,
  Bad,
  "%(field_name)s's syntax is incorrect.",
  "The value `%(value)s` doesn't conform to the grammar for `%(field_name)s`; see %(reference)s."
);
kind!(
  SINGLE_HEADER_REPEAT,
  "SINGLE_HEADER_REPEAT",
  General,
  Bad,
  "%(field_name)s shouldn't have more than one value in a response.",
  "The last occurrence of `%(field_name)s` was used; earlier ones were discarded."
);
kind!(
  HEADER_TOO_LARGE,
  "HEADER_TOO_LARGE",
  General,
  Warn,
  "A header is very large (%(header_length)s bytes).",
  "Most servers limit individual header lines well below this."
);
kind!(
  HEADER_BLOCK_TOO_LARGE,
  "HEADER_BLOCK_TOO_LARGE",
  General,
  Warn,
  "The whole header block is very large (%(header_length)s bytes).",
  "Some clients and intermediaries impose limits here."
);
kind!(
  HEADER_NAME_ENCODING,
  "HEADER_NAME_ENCODING",
  General,
  Bad,
  "%(field_name)s's name isn't pure ASCII.",
  "Header names are restricted to the token production; non-ASCII bytes were replaced."
);
kind!(
  HEADER_VALUE_ENCODING,
  "HEADER_VALUE_ENCODING",
  General,
  Warn,
  "%(field_name)s's value isn't pure ASCII.",
  "The value was decoded as ISO-8859-1 instead."
);
kind!(
  FIELD_NAME_BAD_SYNTAX,
  "FIELD_NAME_BAD_SYNTAX",
  General,
  Bad,
  "A header's name is malformed.",
  "`%(field_name)s` doesn't match the token production and was skipped."
);

// --- parameter parsing (4.2, RFC 5987) ---

kind!(
  PARAM_REPEATS,
  "PARAM_REPEATS",
  General,
  Warn,
  "The '%(param)s' parameter on %(field_name)s is repeated.",
  "Only the first occurrence was used."
);
kind!(
  PARAM_SINGLE_QUOTED,
  "PARAM_SINGLE_QUOTED",
  General,
  Warn,
  "The '%(param)s' parameter on %(field_name)s is single-quoted.",
  "Parameter values should be unquoted or double-quoted, not single-quoted."
);
kind!(
  PARAM_STAR_QUOTED,
  "PARAM_STAR_QUOTED",
  General,
  Bad,
  "The '%(param)s*' parameter on %(field_name)s is quoted.",
  "RFC 5987 extended parameters must not be quoted."
);
kind!(
  PARAM_STAR_ERROR,
  "PARAM_STAR_ERROR",
  General,
  Bad,
  "The '%(param)s*' parameter on %(field_name)s is malformed.",
  "Extended parameters need the form charset'language'value."
);
kind!(
  PARAM_STAR_NOCHARSET,
  "PARAM_STAR_NOCHARSET",
  General,
  Bad,
  "The '%(param)s*' parameter on %(field_name)s has no charset.",
  "Extended parameters need the form charset'language'value."
);
kind!(
  PARAM_STAR_CHARSET,
  "PARAM_STAR_CHARSET",
  General,
  Bad,
  "The '%(param)s*' parameter on %(field_name)s uses charset '%(charset)s'.",
  "Only utf-8 is accepted as the charset of an RFC 5987 extended parameter."
);
kind!(
  PARAM_STAR_BAD,
  "PARAM_STAR_BAD",
  General,
  Bad,
  "The '%(param)s*' parameter on %(field_name)s isn't validly percent-encoded.",
  "The value couldn't be percent-decoded as utf-8."
);

kind!(
  BAD_DATE_SYNTAX,
  "BAD_DATE_SYNTAX",
  General,
  Bad,
  "%(field_name)s's value isn't a valid date.",
  "`%(value)s` doesn't parse as an HTTP-date."
);

// --- message ingestion (4.3) ---

kind!(
  BAD_GZIP,
  "BAD_GZIP",
  ContentNegotiation,
  Bad,
  "This response's gzip header is malformed.",
  "The gzip framing (magic bytes, method, flags) couldn't be parsed."
);
kind!(
  BAD_ZLIB,
  "BAD_ZLIB",
  ContentNegotiation,
  Bad,
  "This response's compressed body couldn't be decompressed (%(zlib_error)s).",
  "The stream failed after offset %(offset)s; sample: `%(sample)s`."
);
kind!(
  BODY_NOT_ALLOWED,
  "BODY_NOT_ALLOWED",
  Connection,
  Bad,
  "%(response)s has a body, but isn't allowed to.",
  "A response to this request or with this status isn't allowed to carry a body."
);
kind!(
  BAD_CHUNK,
  "BAD_CHUNK",
  Connection,
  Bad,
  "%(response)s had a chunked encoding error.",
  "Sample of the offending chunk: `%(chunk_sample)s`."
);
kind!(
  CL_CORRECT,
  "CL_CORRECT",
  General,
  Good,
  "Content-Length is correct.",
  "The declared length matches the %(payload_len)s bytes received."
);
kind!(
  CL_INCORRECT,
  "CL_INCORRECT",
  General,
  Bad,
  "Content-Length is incorrect.",
  "%(payload_len)s bytes were received, not the declared length."
);
kind!(
  CMD5_CORRECT,
  "CMD5_CORRECT",
  Validation,
  Good,
  "Content-MD5 is correct.",
  "It matches the calculated value %(calc_md5)s."
);
kind!(
  CMD5_INCORRECT,
  "CMD5_INCORRECT",
  Validation,
  Bad,
  "Content-MD5 is incorrect.",
  "The calculated value is %(calc_md5)s."
);
kind!(
  URI_BAD_SYNTAX,
  "URI_BAD_SYNTAX",
  General,
  Bad,
  "The URI's syntax isn't valid.",
  "`%(uri)s` doesn't conform to RFC 3986."
);
kind!(
  URI_TOO_LONG,
  "URI_TOO_LONG",
  General,
  Warn,
  "The URI is very long (%(uri_len)s characters).",
  "Some clients and servers limit URI length well below this."
);

// --- cache evaluator (4.4) ---

kind!(
  LM_FUTURE,
  "LM_FUTURE",
  Caching,
  Bad,
  "Last-Modified is in the future.",
  "A future Last-Modified value usually indicates a clock problem."
);
kind!(
  LM_PRESENT,
  "LM_PRESENT",
  Caching,
  Info,
  "The resource last changed %(lm_diff)s ago.",
  "According to Last-Modified, %(response)s was last changed %(lm_diff)s ago."
);
kind!(
  CC_MISCAP,
  "CC_MISCAP",
  Caching,
  Warn,
  "The %(cc_directive)s Cache-Control directive isn't lowercase.",
  "Directive names are case-sensitive; `%(cc_directive)s` won't be recognised as intended."
);
kind!(
  CC_DUP,
  "CC_DUP",
  Caching,
  Warn,
  "The %(cc_directive)s Cache-Control directive appears more than once.",
  "Single-value directives should only be specified once."
);
kind!(
  METHOD_UNCACHEABLE,
  "METHOD_UNCACHEABLE",
  Caching,
  Info,
  "Responses to %(method)s aren't cacheable.",
  "Only responses to safe, cacheable methods may be stored."
);
kind!(
  NO_STORE,
  "NO_STORE",
  Caching,
  Info,
  "%(response)s shouldn't be stored by any cache.",
  "The no-store directive forbids any caching of this response."
);
kind!(
  PRIVATE_CC,
  "PRIVATE_CC",
  Caching,
  Info,
  "%(response)s is private, and only cacheable by the client.",
  "Shared caches must not store this response, but private caches may."
);
kind!(
  PRIVATE_AUTH,
  "PRIVATE_AUTH",
  Caching,
  Info,
  "%(response)s is considered private because the request was authenticated.",
  "Shared caches may not store a response to an authenticated request unless `public` is present."
);
kind!(
  STOREABLE,
  "STOREABLE",
  Caching,
  Info,
  "%(response)s allows all caches to store it.",
  "Nothing in the response forbids storage by either shared or private caches."
);
kind!(
  NO_CACHE,
  "NO_CACHE",
  Caching,
  Info,
  "%(response)s must be revalidated before each use.",
  "The no-cache directive forces revalidation on every use."
);
kind!(
  NO_CACHE_NO_VALIDATOR,
  "NO_CACHE_NO_VALIDATOR",
  Caching,
  Bad,
  "%(response)s can't be revalidated, since it has no validator.",
  "no-cache was specified, but there's no Last-Modified or ETag to revalidate against."
);
kind!(
  CHECK_SINGLE,
  "CHECK_SINGLE",
  Caching,
  Bad,
  "Only one of pre-check/post-check is present.",
  "Both pre-check and post-check are needed for either to have effect."
);
kind!(
  CHECK_NOT_INTEGER,
  "CHECK_NOT_INTEGER",
  Caching,
  Bad,
  "pre-check/post-check aren't integers.",
  "Both values must be non-negative integers."
);
kind!(
  CHECK_ALL_ZERO,
  "CHECK_ALL_ZERO",
  Caching,
  Info,
  "pre-check and post-check are both '0'.",
  "This has no effect in practice and can be removed."
);
kind!(
  CHECK_POST_BIGGER,
  "CHECK_POST_BIGGER",
  Caching,
  Bad,
  "post-check's value is larger than pre-check's.",
  "post-check should be smaller than or equal to pre-check."
);
kind!(
  CHECK_POST_ZERO,
  "CHECK_POST_ZERO",
  Caching,
  Info,
  "post-check is '0', so no caching of the response is recommended.",
  "A post-check of 0 instructs caches not to serve a stale copy."
);
kind!(
  CHECK_POST_PRE,
  "CHECK_POST_PRE",
  Caching,
  Info,
  "pre-check=%(precheck)s, post-check=%(postcheck)s.",
  "These are Internet-Explorer-specific caching directives."
);
kind!(
  VARY_ASTERISK,
  "VARY_ASTERISK",
  Caching,
  Bad,
  "Vary: * effectively makes this response uncacheable.",
  "A shared cache must treat every request for this resource as unique."
);
kind!(
  VARY_COMPLEX,
  "VARY_COMPLEX",
  Caching,
  Warn,
  "This response varies on %(vary_count)s headers.",
  "A complex Vary can hurt cache hit rates significantly."
);
kind!(
  VARY_USER_AGENT,
  "VARY_USER_AGENT",
  Caching,
  Warn,
  "Vary: User-Agent can hurt cache efficiency.",
  "Caches often vary their behaviour based on normalised classes of User-Agent, not the raw header."
);
kind!(
  VARY_HOST,
  "VARY_HOST",
  Caching,
  Info,
  "Vary: Host is unnecessary.",
  "HTTP caches always vary on the effective request authority."
);
kind!(
  CURRENT_AGE,
  "CURRENT_AGE",
  Caching,
  Info,
  "%(response)s has been cached for %(current_age)s seconds.",
  "The Age header indicates how long this response has been held by an intermediate cache."
);
kind!(
  DATE_CLOCKLESS,
  "DATE_CLOCKLESS",
  Caching,
  Warn,
  "%(response)s doesn't have a Date header.",
  "Without Date, clock skew and age can't be calculated."
);
kind!(
  DATE_CLOCKLESS_BAD_HDR,
  "DATE_CLOCKLESS_BAD_HDR",
  Caching,
  Bad,
  "Expires and Last-Modified are unreliable without a Date header.",
  "Without Date, caches can't calculate the age of this response relative to these headers."
);
kind!(
  AGE_PENALTY,
  "AGE_PENALTY",
  Caching,
  Warn,
  "This response is older than it looks.",
  "Age (%(current_age)s) exceeds what's explained by clock skew (%(skew)s)."
);
kind!(
  DATE_INCORRECT,
  "DATE_INCORRECT",
  Caching,
  Bad,
  "Date is %(clock_skew_string)s.",
  "There is a clock skew of %(clock_skew_string)s between the origin server and the client."
);
kind!(
  DATE_CORRECT,
  "DATE_CORRECT",
  Caching,
  Good,
  "Date is correct.",
  "The server's clock is in sync with the client's."
);
kind!(
  FRESHNESS_HEURISTIC,
  "FRESHNESS_HEURISTIC",
  Caching,
  Warn,
  "%(response)s allows a cache to assume freshness heuristically.",
  "No explicit freshness lifetime was given, but the status is heuristically cacheable."
);
kind!(
  FRESHNESS_NONE,
  "FRESHNESS_NONE",
  Caching,
  Info,
  "%(response)s can't be served from cache without revalidation.",
  "No freshness information is available and the status isn't heuristically cacheable."
);
kind!(
  FRESHNESS_FRESH,
  "FRESHNESS_FRESH",
  Caching,
  Good,
  "%(response)s is fresh for %(freshness_left)s more seconds.",
  "The freshness lifetime was %(freshness_lifetime)s seconds."
);
kind!(
  FRESHNESS_STALE_CACHE,
  "FRESHNESS_STALE_CACHE",
  Caching,
  Bad,
  "%(response)s has been served stale by a cache.",
  "Its age (%(current_age)s) exceeds its freshness lifetime (%(freshness_lifetime)s)."
);
kind!(
  FRESHNESS_STALE_ALREADY,
  "FRESHNESS_STALE_ALREADY",
  Caching,
  Warn,
  "%(response)s is already stale.",
  "Its age (%(current_age)s) exceeds its freshness lifetime (%(freshness_lifetime)s)."
);
kind!(
  FRESH_MUST_REVALIDATE,
  "FRESH_MUST_REVALIDATE",
  Caching,
  Info,
  "This response must be revalidated once stale.",
  "must-revalidate is present, so a cache must not serve this response once it's stale."
);
kind!(
  STALE_MUST_REVALIDATE,
  "STALE_MUST_REVALIDATE",
  Caching,
  Bad,
  "This stale response must be revalidated before reuse.",
  "must-revalidate forbids serving a stale copy without revalidation."
);
kind!(
  FRESH_PROXY_REVALIDATE,
  "FRESH_PROXY_REVALIDATE",
  Caching,
  Info,
  "This response must be revalidated by shared caches once stale.",
  "proxy-revalidate (or s-maxage) applies only to shared caches."
);
kind!(
  STALE_PROXY_REVALIDATE,
  "STALE_PROXY_REVALIDATE",
  Caching,
  Bad,
  "This stale response must be revalidated by shared caches.",
  "proxy-revalidate (or s-maxage) forbids a shared cache from serving it stale."
);
kind!(
  FRESH_SERVABLE,
  "FRESH_SERVABLE",
  Caching,
  Good,
  "This response may be served from cache without revalidation.",
  "Nothing requires revalidation while the response is fresh."
);
kind!(
  STALE_SERVABLE,
  "STALE_SERVABLE",
  Caching,
  Warn,
  "This stale response may still be served from cache.",
  "Neither must-revalidate nor proxy-revalidate is present."
);
kind!(
  PUBLIC,
  "PUBLIC",
  Caching,
  Info,
  "This response is marked as public.",
  "public overrides the default privacy heuristic, allowing shared caching of authenticated responses."
);

// --- robots / fetch orchestrator (4.5) ---

kind!(
  ROBOTS_FORBIDDEN,
  "ROBOTS_FORBIDDEN",
  General,
  Bad,
  "This request is forbidden by the origin's robots.txt.",
  "robots.txt disallows fetching this URI with our User-Agent."
);

// --- active checks (4.6) ---

kind!(
  ETAG_SUBREQ_PROBLEM,
  "ETAG_SUBREQ_PROBLEM",
  Validation,
  Bad,
  "There was a problem checking for ETag validation support (%(problem)s).",
  "The subrequest didn't complete, so If-None-Match support couldn't be determined."
);
kind!(
  INM_304,
  "INM_304",
  Validation,
  Good,
  "If-None-Match conditional requests are supported.",
  "Sending If-None-Match resulted in a 304 Not Modified response."
);
kind!(
  INM_FULL,
  "INM_FULL",
  Validation,
  Info,
  "An If-None-Match conditional request returned the full response again.",
  "The server doesn't seem to support If-None-Match on this resource."
);
kind!(
  INM_DUP_ETAG_WEAK,
  "INM_DUP_ETAG_WEAK",
  Validation,
  Info,
  "The same weak ETag was issued for two different responses.",
  "A weak ETag may be shared between semantically-equivalent-but-not-identical representations."
);
kind!(
  INM_DUP_ETAG_STRONG,
  "INM_DUP_ETAG_STRONG",
  Validation,
  Bad,
  "The same strong ETag (%(etag)s) was issued for two different responses.",
  "A strong ETag must uniquely identify the exact bytes of a representation."
);
kind!(
  INM_UNKNOWN,
  "INM_UNKNOWN",
  Validation,
  Info,
  "The If-None-Match response has an unexpected ETag.",
  "The probe returned a different ETag than either the base response's or a match."
);
kind!(
  INM_STATUS,
  "INM_STATUS",
  Validation,
  Info,
  "An If-None-Match conditional request got a %(inm_status)s response.",
  "The status code %(enc_inm_status)s doesn't indicate support or non-support."
);
kind!(
  MISSING_HDRS_304,
  "MISSING_HDRS_304",
  Validation,
  Warn,
  "%(missing_hdrs)s %(missing)s missing from the %(subreq_type)s response.",
  "A 304 response should repeat cache-related headers present on the full response."
);

kind!(
  LM_SUBREQ_PROBLEM,
  "LM_SUBREQ_PROBLEM",
  Validation,
  Bad,
  "There was a problem checking for Last-Modified validation support (%(problem)s).",
  "The subrequest didn't complete, so If-Modified-Since support couldn't be determined."
);
kind!(
  IMS_304,
  "IMS_304",
  Validation,
  Good,
  "If-Modified-Since conditional requests are supported.",
  "Sending If-Modified-Since resulted in a 304 Not Modified response."
);
kind!(
  IMS_FULL,
  "IMS_FULL",
  Validation,
  Info,
  "An If-Modified-Since conditional request returned the full response again.",
  "The server doesn't seem to support If-Modified-Since on this resource."
);
kind!(
  IMS_UNKNOWN,
  "IMS_UNKNOWN",
  Validation,
  Info,
  "The If-Modified-Since response is inconclusive.",
  "The probe's status and body didn't clearly match or differ from the base response."
);
kind!(
  IMS_STATUS,
  "IMS_STATUS",
  Validation,
  Info,
  "An If-Modified-Since conditional request got a %(ims_status)s response.",
  "This status code doesn't indicate support or non-support."
);

kind!(
  RANGE_SUBREQ_PROBLEM,
  "RANGE_SUBREQ_PROBLEM",
  Range,
  Bad,
  "There was a problem checking for Range support (%(problem)s).",
  "The subrequest didn't complete, so partial content support couldn't be determined."
);
kind!(
  RANGE_CORRECT,
  "RANGE_CORRECT",
  Range,
  Good,
  "A ranged request returned the correct partial content.",
  "The requested byte range matches the corresponding slice of the full response."
);
kind!(
  RANGE_INCORRECT,
  "RANGE_INCORRECT",
  Range,
  Bad,
  "A ranged request returned partial content that doesn't match.",
  "Expected `%(range_expected)s`, received `%(range_received)s`."
);
kind!(
  RANGE_CHANGED,
  "RANGE_CHANGED",
  Range,
  Warn,
  "The resource changed between the full and ranged requests.",
  "The comparison is inconclusive because the underlying representation changed."
);
kind!(
  RANGE_FULL,
  "RANGE_FULL",
  Range,
  Info,
  "A ranged request returned the full response instead of a partial one.",
  "The server doesn't seem to support range requests on this resource."
);
kind!(
  RANGE_STATUS,
  "RANGE_STATUS",
  Range,
  Info,
  "A ranged request got a %(range_status)s response.",
  "This status code doesn't indicate support or non-support of range requests."
);
kind!(
  MISSING_HDRS_206,
  "MISSING_HDRS_206",
  Range,
  Warn,
  "%(missing)s missing from the 206 response.",
  "A 206 Partial Content response should carry these headers."
);

kind!(
  CONNEG_SUBREQ_PROBLEM,
  "CONNEG_SUBREQ_PROBLEM",
  ContentNegotiation,
  Bad,
  "There was a problem checking for content negotiation support (%(problem)s).",
  "The uncompressed baseline subrequest didn't complete."
);
kind!(
  CONNEG_GZIP_GOOD,
  "CONNEG_GZIP_GOOD",
  ContentNegotiation,
  Good,
  "Content negotiation for gzip compression is supported, saving %(savings)s%%.",
  "Asking for gzip returned a smaller, equivalent representation."
);
kind!(
  CONNEG_GZIP_BAD,
  "CONNEG_GZIP_BAD",
  ContentNegotiation,
  Bad,
  "Negotiating for gzip compression made the response bigger.",
  "The gzip-encoded response was larger than the uncompressed baseline."
);
kind!(
  CONNEG_NO_GZIP,
  "CONNEG_NO_GZIP",
  ContentNegotiation,
  Info,
  "This resource doesn't support gzip compression.",
  "The uncompressed and compressed requests returned identical Content-Encoding."
);
kind!(
  CONNEG_NO_VARY,
  "CONNEG_NO_VARY",
  ContentNegotiation,
  Bad,
  "This response is negotiated, but doesn't carry Vary: Accept-Encoding.",
  "Caches need Vary: Accept-Encoding to store the correct representation for each client."
);
kind!(
  CONNEG_GZIP_WITHOUT_ASKING,
  "CONNEG_GZIP_WITHOUT_ASKING",
  ContentNegotiation,
  Bad,
  "A gzip-encoded response was returned even though it wasn't asked for.",
  "The uncompressed baseline request didn't send Accept-Encoding: gzip, yet got one back."
);
kind!(
  VARY_INCONSISTENT,
  "VARY_INCONSISTENT",
  ContentNegotiation,
  Bad,
  "Asking for different things got inconsistent Vary behaviour.",
  "The set of varying headers should be the same regardless of representation."
);
kind!(
  VARY_STATUS_MISMATCH,
  "VARY_STATUS_MISMATCH",
  ContentNegotiation,
  Bad,
  "Negotiating for gzip changed the status code.",
  "The compressed and uncompressed requests should return the same status."
);
kind!(
  VARY_HEADER_MISMATCH,
  "VARY_HEADER_MISMATCH",
  ContentNegotiation,
  Warn,
  "Negotiating for gzip changed unrelated headers.",
  "Headers other than Content-Encoding/Content-Length differ between variants."
);
kind!(
  VARY_BODY_MISMATCH,
  "VARY_BODY_MISMATCH",
  ContentNegotiation,
  Bad,
  "The compressed and uncompressed bodies don't decode to the same content.",
  "The decoded gzip body and the uncompressed baseline body differ."
);
kind!(
  CONTENT_TRANSFER_ENCODING,
  "CONTENT_TRANSFER_ENCODING",
  General,
  Warn,
  "Content-Transfer-Encoding is a MIME header, not an HTTP one.",
  "It has no meaning in this context and is usually a sign of a misconfigured gateway."
);
kind!(
  UA_COMPATIBLE,
  "UA_COMPATIBLE",
  General,
  Info,
  "%(response)s explicitly sets a rendering mode for Internet Explorer.",
  "X-UA-Compatible lets a response request a specific compatibility mode from the browser."
);
kind!(
  UA_COMPATIBLE_REPEAT,
  "UA_COMPATIBLE_REPEAT",
  General,
  Bad,
  "%(response)s has multiple X-UA-Compatible directives targeted at the same UA.",
  "More than one directive aimed at the same browser may cause unpredictable results."
);
kind!(
  VARY_ETAG_DOESNT_CHANGE,
  "VARY_ETAG_DOESNT_CHANGE",
  ContentNegotiation,
  Bad,
  "The ETag doesn't change between negotiated representations.",
  "A strong ETag should be specific to each variant when Vary: Accept-Encoding is used."
);
