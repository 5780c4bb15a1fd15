//! HTML usage page served for `?help` and unknown routes.

pub const HELP_PAGE: &str = r#"<pre style="font-family:monospace">
Prism - on-demand image transformation

Addressing an image by asset path
---------------------------------
/uri/{directives separated by colons}/{asset identifier}
  /uri/rw=480:rh=320:cw=800:ch=600:cx=200:cy=200:q=50/mgid:file:gsp:assets:/images/show/still.jpg

Addressing an image by content item
-----------------------------------
/oid/{directives separated by colons}/{content identifier}
  /oid/rw=480:rh=320:q=50/mgid:arc:series:example.com:7c2d44b4-c8b1-43a9-9bfc-32af988eab20
The item's images and authored crops are looked up and the one closest to
the requested aspect ratio is used.

Resize (one dimension is enough, the other follows the aspect ratio)
------
rw  width in pixels
rh  height in pixels

Crop (cw and ch are both required)
----
cw  crop width in pixels
ch  crop height in pixels
cx  x offset from the top left corner, default 0
cy  y offset from the top left corner, default 0
cc  center the crop, overrides cx and cy: 1 or 0, default 0

Output
------
q   quality, 0.5 and 50 mean the same; 1 means 1 out of 100
f   format: jpg, png, webp or gif; ignored for animations
n   normalize contrast on every color channel: 1 or 0, default 0

Animation
---------
am=s  first frame only
am=p  preview: at most 5 frames, 1.5 seconds each

Query parameters
----------------
help          this page
debug         describe how the request was processed instead of returning the image
cacheRefresh  bypass the caches and fetch the image again from the origin
</pre>
"#;
